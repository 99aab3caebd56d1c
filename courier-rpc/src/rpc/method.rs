use prople_jsonrpc_core::types::RpcMethod;

use crate::common::types::CommonError;

pub const RPC_METHOD_PREFIX: &str = "prople.courier";
pub const RPC_DOMAIN_AGENT: &str = "agent";

pub trait RpcMethodBuilder {
    fn build_path(&self) -> &str;
}

pub fn build_rpc_method(method: impl RpcMethodBuilder) -> RpcMethod {
    RpcMethod::from(format!("{}.{}", RPC_METHOD_PREFIX, method.build_path()))
}

/// `AgentMethod` maps an agent method into its `prople.courier.agent.<method>` rpc path
#[derive(Clone, Debug, PartialEq)]
pub struct AgentMethod {
    name: String,
    path: String,
}

impl AgentMethod {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: format!("{}.{}", RPC_DOMAIN_AGENT, name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl RpcMethodBuilder for AgentMethod {
    fn build_path(&self) -> &str {
        &self.path
    }
}

impl TryFrom<RpcMethod> for AgentMethod {
    type Error = CommonError;

    fn try_from(value: RpcMethod) -> Result<Self, Self::Error> {
        let given = value.to_string();
        let prefix = format!("{}.{}.", RPC_METHOD_PREFIX, RPC_DOMAIN_AGENT);

        match given.strip_prefix(&prefix) {
            Some(name) if !name.is_empty() => Ok(AgentMethod::new(name)),
            _ => Err(CommonError::MethodError(format!(
                "unknown method: {}",
                given
            ))),
        }
    }
}
