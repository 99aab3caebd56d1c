use rst_common::standard::serde_json::Value;

use super::Agent;

/// `Context` is created for each top level execution
///
/// It exposes the agent itself, so a plugin method is able to call other plugin's
/// methods, and the optional metadata given by the caller
#[derive(Clone)]
pub struct Context {
    agent: Agent,
    metadata: Option<Value>,
}

impl Context {
    pub fn new(agent: Agent, metadata: Option<Value>) -> Self {
        Self { agent, metadata }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }
}
