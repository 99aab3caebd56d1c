use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rst_common::standard::serde::de::DeserializeOwned;
use rst_common::standard::serde_json::{self, json, Value};
use rst_common::with_logging::log::{debug, warn};
use rst_common::with_tokio::tokio;
use rst_common::with_tokio::tokio::sync::broadcast;

use super::types::{
    AgentError, AgentEvent, Capability, MethodFn, Plugin, PluginInfo, EVENT_DID_EXECUTE,
    EVENT_EXECUTION_FAILED,
};
use super::Context;

const DEFAULT_EVENT_CAPACITY: usize = 64;

struct MethodEntry {
    plugin: String,
    capability: Capability,
    handler: MethodFn,
}

struct Inner {
    plugins: Vec<PluginInfo>,
    methods: HashMap<String, MethodEntry>,
    events: broadcast::Sender<AgentEvent>,
}

/// `AgentBuilder` collects plugins and verifies their method tables before
/// an [`Agent`] is created
///
/// Registration happens once, at startup. The produced [`Agent`] carries an immutable
/// method table, so there is no way to register a new plugin into a running agent
pub struct AgentBuilder {
    plugins: Vec<PluginInfo>,
    methods: HashMap<String, MethodEntry>,
    event_capacity: usize,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_capacity(&mut self, capacity: usize) -> &mut Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// `register_plugins` merges all plugin methods into the method table
    ///
    /// The whole list is validated before anything is merged. A method declared twice,
    /// either inside the given list or against previous registrations, fails with
    /// [`AgentError::DuplicateMethod`]. A method without a callable handler fails
    /// with [`AgentError::InvalidPlugin`]
    pub fn register_plugins(
        &mut self,
        plugins: Vec<Arc<dyn Plugin>>,
    ) -> Result<&mut Self, AgentError> {
        let mut staged: Vec<(PluginInfo, Vec<(String, MethodEntry)>)> = Vec::new();
        let mut staged_names: HashMap<String, String> = HashMap::new();

        for plugin in plugins.into_iter() {
            let plugin_name = plugin.name();
            if plugin_name.is_empty() {
                return Err(AgentError::InvalidPlugin(
                    "plugin name is missing".to_string(),
                ));
            }

            let mut info = PluginInfo {
                name: plugin_name.clone(),
                methods: Vec::new(),
                capabilities: Vec::new(),
            };

            let mut entries = Vec::new();
            for spec in plugin.methods().into_iter() {
                if spec.name.is_empty() {
                    return Err(AgentError::InvalidPlugin(format!(
                        "plugin {} declares a method without name",
                        plugin_name
                    )));
                }

                let handler = spec.handler.ok_or(AgentError::InvalidPlugin(format!(
                    "plugin {} declares {} without implementation",
                    plugin_name, spec.name
                )))?;

                if let Some(entry) = self.methods.get(&spec.name) {
                    return Err(AgentError::DuplicateMethod {
                        method: spec.name,
                        plugin: entry.plugin.to_owned(),
                    });
                }

                if let Some(owner) = staged_names.get(&spec.name) {
                    return Err(AgentError::DuplicateMethod {
                        method: spec.name,
                        plugin: owner.to_owned(),
                    });
                }

                staged_names.insert(spec.name.clone(), plugin_name.clone());
                info.methods.push(spec.name.clone());
                if !info.capabilities.contains(&spec.capability) {
                    info.capabilities.push(spec.capability);
                }

                entries.push((
                    spec.name,
                    MethodEntry {
                        plugin: plugin_name.clone(),
                        capability: spec.capability,
                        handler,
                    },
                ));
            }

            staged.push((info, entries));
        }

        for (info, entries) in staged.into_iter() {
            debug!(
                "registering plugin {} with methods: {:?}",
                info.name, info.methods
            );

            for (name, entry) in entries.into_iter() {
                self.methods.insert(name, entry);
            }

            self.plugins.push(info);
        }

        Ok(self)
    }

    pub fn build(&mut self) -> Agent {
        let (events, _) = broadcast::channel(self.event_capacity);
        let inner = Inner {
            plugins: std::mem::take(&mut self.plugins),
            methods: std::mem::take(&mut self.methods),
            events,
        };

        Agent {
            inner: Arc::new(inner),
        }
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self {
            plugins: Vec::new(),
            methods: HashMap::new(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// `Agent` is the single dispatch surface over all registered plugins
///
/// It's cheap to clone, all clones share the same immutable method table
/// and the same event channel
#[derive(Clone)]
pub struct Agent {
    inner: Arc<Inner>,
}

impl Agent {
    pub fn new(plugins: Vec<Arc<dyn Plugin>>) -> Result<Self, AgentError> {
        let mut builder = AgentBuilder::new();
        builder.register_plugins(plugins)?;
        Ok(builder.build())
    }

    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// `available_methods` returns the sorted names of every dispatchable method
    pub fn available_methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.inner.methods.keys().cloned().collect();
        methods.sort();
        methods
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.inner.methods.contains_key(method)
    }

    pub fn plugins(&self) -> Vec<PluginInfo> {
        self.inner.plugins.clone()
    }

    pub fn capability_of(&self, method: &str) -> Option<Capability> {
        self.inner.methods.get(method).map(|entry| entry.capability)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.inner.events.subscribe()
    }

    /// `emit` publishes an event to all current observers
    ///
    /// Delivery is best-effort, an event without any observer is simply dropped
    pub fn emit(&self, event: AgentEvent) {
        let _ = self.inner.events.send(event);
    }

    pub async fn execute(
        &self,
        method: &str,
        args: Value,
        metadata: Option<Value>,
    ) -> Result<Value, AgentError> {
        let entry = self
            .inner
            .methods
            .get(method)
            .ok_or(AgentError::UnknownMethod(method.to_string()))?;

        debug!("executing {} served by {}", method, entry.plugin);

        let ctx = Context::new(self.clone(), metadata);
        match (entry.handler)(args.clone(), ctx).await {
            Ok(result) => {
                self.emit(AgentEvent::new(
                    EVENT_DID_EXECUTE,
                    json!({ "method": method, "plugin": entry.plugin }),
                ));

                Ok(result)
            }
            Err(err) => {
                warn!("method {} failed: {}", method, err);

                self.emit(AgentEvent::new(
                    EVENT_EXECUTION_FAILED,
                    json!({
                        "method": method,
                        "plugin": entry.plugin,
                        "error": err.to_string(),
                    }),
                ));

                Err(AgentError::PluginExecution {
                    plugin: entry.plugin.to_owned(),
                    method: method.to_string(),
                    args,
                    cause: Box::new(err),
                })
            }
        }
    }

    /// `execute_as` executes the method and decodes its output into `T`
    pub async fn execute_as<T>(
        &self,
        method: &str,
        args: Value,
        metadata: Option<Value>,
    ) -> Result<T, AgentError>
    where
        T: DeserializeOwned,
    {
        let output = self.execute(method, args, metadata).await?;
        serde_json::from_value(output).map_err(|err| AgentError::JSONError(err.to_string()))
    }

    /// `execute_with_timeout` gives the caller a deadline over a single execution
    ///
    /// The core itself never sets any default timeout
    pub async fn execute_with_timeout(
        &self,
        method: &str,
        args: Value,
        metadata: Option<Value>,
        timeout: Duration,
    ) -> Result<Value, AgentError> {
        tokio::time::timeout(timeout, self.execute(method, args, metadata))
            .await
            .map_err(|_| AgentError::Timeout {
                method: method.to_string(),
                millis: timeout.as_millis(),
            })?
    }
}
