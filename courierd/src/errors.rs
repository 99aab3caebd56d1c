use rst_common::with_errors::thiserror::{self, Error};

#[derive(Debug, Error)]
pub enum CourierError {
    #[error("rpc error: {0}")]
    RpcError(String),

    #[error("config error: {0}")]
    ConfigError(String),
}
