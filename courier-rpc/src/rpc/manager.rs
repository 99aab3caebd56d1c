use prople_jsonrpc_core::objects::RpcProcessor;
use prople_jsonrpc_core::types::RpcRoute;

use prople_courier_core::agent::Agent;

use crate::common::types::{CommonError, RPCService};

use super::handler::AgentHandler;
use super::method::{build_rpc_method, AgentMethod};

/// `AgentService` publishes each agent method as its own rpc route
pub struct AgentService {
    agent: Agent,
    handler: Option<AgentHandler>,
    routes: Vec<RpcRoute>,
}

impl AgentService {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent,
            handler: None,
            routes: Vec::new(),
        }
    }
}

impl RPCService for AgentService {
    fn build(&mut self) -> Result<(), CommonError> {
        self.handler = Some(AgentHandler::new(self.agent.clone()));
        Ok(())
    }

    fn setup_rpc(&mut self) -> Result<(), CommonError> {
        let handler = self
            .handler
            .as_ref()
            .ok_or(CommonError::RpcError(String::from("missing agent handler")))?;

        let controller = Box::new(handler.clone());
        for method in self.agent.available_methods().iter() {
            self.routes.push(RpcRoute::new(
                build_rpc_method(AgentMethod::new(method)),
                controller.clone(),
            ));
        }

        Ok(())
    }

    fn routes(&self) -> Vec<RpcRoute> {
        self.routes.clone()
    }
}

pub struct Manager {
    processor: RpcProcessor,
    methods: Vec<String>,
}

impl Manager {
    pub fn new() -> Self {
        let processor = RpcProcessor::default();
        Self {
            processor,
            methods: Vec::new(),
        }
    }

    pub fn build_agent_service(&mut self, agent: Agent) -> Result<&mut Self, CommonError> {
        let methods = agent.available_methods();
        let mut agent_rpc = AgentService::new(agent);

        let _ = agent_rpc.build()?;
        let _ = agent_rpc.setup_rpc()?;
        let routes = agent_rpc.routes();

        if routes.is_empty() {
            return Err(CommonError::RpcError(String::from(
                "agent doesn't have any routes",
            )));
        }

        for route in routes.iter() {
            self.processor.register_route(route.clone());
        }

        self.methods.extend(
            methods
                .iter()
                .map(|method| build_rpc_method(AgentMethod::new(method)).to_string()),
        );

        Ok(self)
    }

    pub fn processor(&self) -> RpcProcessor {
        self.processor.clone()
    }

    /// `methods` lists the full rpc names of every registered agent method
    pub fn methods(&self) -> Vec<String> {
        self.methods.clone()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}
