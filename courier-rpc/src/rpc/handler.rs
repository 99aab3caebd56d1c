use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::Value;

use prople_jsonrpc_core::types::{RpcError, RpcHandler, RpcHandlerOutput, RpcMethod};

use prople_courier_core::agent::Agent;

use super::method::AgentMethod;
use super::param::Param;

/// `AgentHandler` dispatches any `prople.courier.agent.*` call to the agent
#[derive(Clone)]
pub struct AgentHandler {
    agent: Agent,
}

impl AgentHandler {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl RpcHandler for AgentHandler {
    async fn call(&self, method: RpcMethod, params: Value) -> RpcHandlerOutput {
        let rpc_method = AgentMethod::try_from(method).map_err(|_| RpcError::InternalError)?;
        let rpc_param = Param::try_from(params).map_err(|_| RpcError::ParseError)?;

        let result = self
            .agent
            .execute(rpc_method.name(), rpc_param.args, rpc_param.metadata)
            .await
            .map_err(|err| RpcError::HandlerError(err.to_string()))?;

        Ok(Some(Box::new(result)))
    }
}
