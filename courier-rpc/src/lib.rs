//! `prople-courier-rpc` exposes a locally assembled agent through JSON-RPC
//!
//! Each agent method is published as `prople.courier.agent.<method>`, with
//! `{ "args": ..., "metadata": ... }` as its params
pub mod common;
use common::helpers;
use common::types::CommonError;

mod config;
pub use config::{Agent as AgentConfig, App, Config, Issuer};
use config::Parser as ConfigManager;

pub mod rpc;
use rpc::{Manager, Runtime};

pub struct CourierRPC {
    config: Config,
}

impl CourierRPC {
    pub fn new(conf_file: &str) -> Result<Self, CommonError> {
        let config = ConfigManager::new(conf_file.to_string())
            .parse()
            .map_err(|err| CommonError::ConfigError(err.to_string()))?;

        let _ = helpers::validate(config.clone())?;
        Ok(Self { config })
    }

    pub fn build_app_config(&self) -> Result<App, CommonError> {
        Ok(self.config.app().clone())
    }

    pub async fn build_rpc_agent(&self) -> Result<Manager, CommonError> {
        let runtime = Runtime::build(self.config.agent()).await?;

        let mut manager = Manager::new();
        let _ = manager.build_agent_service(runtime.agent())?;
        Ok(manager)
    }
}
