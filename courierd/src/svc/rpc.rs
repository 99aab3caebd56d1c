use std::time::Duration;

use rst_common::with_http_tokio::axum::routing::post;
use rst_common::with_http_tokio::axum::Router;
use rst_common::with_http_tokio::tower_http::timeout::TimeoutLayer;
use rst_common::with_http_tokio::tower_http::trace::TraceLayer;
use rst_common::with_logging::log::info;
use rst_common::with_tracing::tracing_subscriber::{
    self, layer::SubscriberExt, util::SubscriberInitExt,
};

use prople_courier_rpc::rpc::Manager;
use prople_courier_rpc::CourierRPC;
use prople_jsonrpc_axum::rpc::{Rpc as RpcAxum, RpcConfig, RpcHandlerFn, RpcState};

use crate::errors::CourierError;

/// `init_tracing` installs the subscriber used by both the http layers and the agent logs
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=debug,prople_courier_core=info,prople_courier_rpc=info,tower_http=debug",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

/// `Rpc` serves a single configured agent through `POST /rpc`
///
/// The configuration is parsed and validated as soon as the service is created,
/// the agent itself is only assembled when the service is requested
pub struct Rpc {
    courier: CourierRPC,
}

impl Rpc {
    pub fn new(conf_file: &str) -> Result<Rpc, CourierError> {
        let courier =
            CourierRPC::new(conf_file).map_err(|err| CourierError::ConfigError(err.to_string()))?;

        Ok(Self { courier })
    }

    async fn agent(&self) -> Result<Manager, CourierError> {
        self.courier
            .build_rpc_agent()
            .await
            .map_err(|err| CourierError::RpcError(err.to_string()))
    }

    /// `methods` lists the rpc methods the configured agent would publish
    pub async fn methods(&self) -> Result<Vec<String>, CourierError> {
        let manager = self.agent().await?;
        Ok(manager.methods())
    }

    pub async fn svc(&self) -> Result<RpcAxum, CourierError> {
        let config_app = self
            .courier
            .build_app_config()
            .map_err(|err| CourierError::ConfigError(err.to_string()))?;

        let manager = self.agent().await?;
        info!("publishing {} agent methods", manager.methods().len());

        // the agent never imposes deadlines, every call is bounded here
        let timeout = Duration::from_secs(config_app.get_timeout());
        let rpc_app = Router::new()
            .route("/rpc", post(RpcHandlerFn))
            .layer((TraceLayer::new_for_http(), TimeoutLayer::new(timeout)));

        let (host, port) = config_app.get_app_config();
        info!("agent rpc listening on {}:{}", host, port);

        Ok(RpcAxum::new(
            RpcConfig::new(host, port),
            RpcState::new(manager.processor()),
            rpc_app,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::env;
    use std::path::PathBuf;

    use rst_common::with_tokio::tokio;

    fn fixture() -> String {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("../courier-rpc/src/config/fixtures/config.toml");
        path.display().to_string()
    }

    #[tokio::test]
    async fn test_list_methods() {
        let rpc = Rpc::new(&fixture()).unwrap();
        let methods = rpc.methods().await.unwrap();

        assert!(methods.contains(&"prople.courier.agent.sendTrustPing".to_string()));
        assert!(methods
            .iter()
            .all(|method| method.starts_with("prople.courier.agent.")))
    }

    #[test]
    fn test_missing_config() {
        let rpc = Rpc::new("./missing.toml");
        assert!(matches!(rpc, Err(CourierError::ConfigError(_))))
    }
}
