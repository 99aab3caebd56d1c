use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::Value;
use rst_common::with_errors::thiserror::{self, Error};

use crate::didcomm::types::{DIDCommError, TransportError};
use crate::identity::types::{KeyStoreError, ResolutionError};
use crate::message::types::MessageError;
use crate::protocols::types::ExchangeError;
use crate::store::types::StoreError;

use super::Context;

pub const METHOD_RESOLVE_DID: &str = "resolveDid";
pub const METHOD_DID_MANAGER_CREATE: &str = "didManagerCreate";
pub const METHOD_KEY_MANAGER_CREATE: &str = "keyManagerCreate";
pub const METHOD_KEY_MANAGER_GET_KEYS: &str = "keyManagerGetKeys";
pub const METHOD_KEY_MANAGER_SIGN: &str = "keyManagerSign";
pub const METHOD_PACK_DIDCOMM_MESSAGE: &str = "packDIDCommMessage";
pub const METHOD_UNPACK_DIDCOMM_MESSAGE: &str = "unpackDIDCommMessage";
pub const METHOD_SEND_DIDCOMM_MESSAGE: &str = "sendDIDCommMessage";
pub const METHOD_GET_DIDCOMM_MESSAGE_MEDIA_TYPE: &str = "getDIDCommMessageMediaType";
pub const METHOD_HANDLE_MESSAGE: &str = "handleMessage";
pub const METHOD_SEND_TRUST_PING: &str = "sendTrustPing";
pub const METHOD_SEND_SELECTIVE_DISCLOSURE_REQUEST: &str = "sendSelectiveDisclosureRequest";
pub const METHOD_DATA_STORE_SAVE: &str = "dataStoreSave";
pub const METHOD_DATA_STORE_QUERY: &str = "dataStoreQuery";

pub const EVENT_DID_EXECUTE: &str = "didExecute";
pub const EVENT_EXECUTION_FAILED: &str = "executionFailed";
pub const EVENT_MESSAGE_HANDLED: &str = "messageHandled";
pub const EVENT_DIDCOMM_MESSAGE_SENT: &str = "didCommMessageSent";

/// `Capability` is a closed set of method groups a [`Plugin`] may serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub enum Capability {
    KeyManager,
    IdentifierManager,
    Resolver,
    Messaging,
    MessageHandler,
    CredentialIssuer,
    SelectiveDisclosure,
    DataStore,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::KeyManager => "key-manager",
            Capability::IdentifierManager => "identifier-manager",
            Capability::Resolver => "resolver",
            Capability::Messaging => "messaging",
            Capability::MessageHandler => "message-handler",
            Capability::CredentialIssuer => "credential-issuer",
            Capability::SelectiveDisclosure => "selective-disclosure",
            Capability::DataStore => "data-store",
        };

        write!(f, "{}", name)
    }
}

/// `PluginError` is the failure a plugin method returns back to the agent
///
/// The agent never exposes it directly, it will always be wrapped
/// inside [`AgentError::PluginExecution`]
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("json error: {0}")]
    JSONError(String),

    #[error("didcomm error: {0}")]
    DIDComm(#[from] DIDCommError),

    #[error("keystore error: {0}")]
    KeyStore(#[from] KeyStoreError),

    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("message error: {0}")]
    Message(#[from] MessageError),

    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("agent error: {0}")]
    Agent(#[from] Box<AgentError>),
}

impl From<AgentError> for PluginError {
    fn from(value: AgentError) -> Self {
        PluginError::Agent(Box::new(value))
    }
}

/// `AgentError` is the base error type of the agent dispatch surface
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("duplicate method: {method} already served by plugin {plugin}")]
    DuplicateMethod { method: String, plugin: String },

    #[error("invalid plugin: {0}")]
    InvalidPlugin(String),

    #[error("plugin {plugin} failed to execute {method} with args {args}: {cause}")]
    PluginExecution {
        plugin: String,
        method: String,
        args: Value,
        #[source]
        cause: Box<PluginError>,
    },

    #[error("method {method} timed out after {millis}ms")]
    Timeout { method: String, millis: u128 },

    #[error("json error: {0}")]
    JSONError(String),
}

impl AgentError {
    /// `cause` gives access to the original plugin failure, if any
    pub fn cause(&self) -> Option<&PluginError> {
        match self {
            AgentError::PluginExecution { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

pub type MethodOutput = Result<Value, PluginError>;
pub type MethodFuture = Pin<Box<dyn Future<Output = MethodOutput> + Send>>;
pub type MethodFn = Arc<dyn Fn(Value, Context) -> MethodFuture + Send + Sync>;

/// `MethodSpec` declares a single named method served by a [`Plugin`]
///
/// A declared method without a handler is treated as an invalid plugin
/// by the agent builder
#[derive(Clone)]
pub struct MethodSpec {
    pub(crate) name: String,
    pub(crate) capability: Capability,
    pub(crate) handler: Option<MethodFn>,
}

impl MethodSpec {
    pub fn new(name: &str, capability: Capability) -> Self {
        Self {
            name: name.to_string(),
            capability,
            handler: None,
        }
    }

    pub fn handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MethodOutput> + Send + 'static,
    {
        let method: MethodFn = Arc::new(move |args, ctx| Box::pin(f(args, ctx)));
        self.handler = Some(method);
        self
    }

    pub fn name(&self) -> String {
        self.name.to_owned()
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }
}

impl fmt::Debug for MethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSpec")
            .field("name", &self.name)
            .field("capability", &self.capability)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// `Plugin` is a unit of methods grouped by [`Capability`]
///
/// Plugins never depend on the agent itself, any call to another plugin's
/// method goes through the [`Context`] given to each handler
pub trait Plugin: Send + Sync {
    fn name(&self) -> String;
    fn methods(self: Arc<Self>) -> Vec<MethodSpec>;
}

/// `PluginInfo` is a read only description of a registered plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct PluginInfo {
    pub name: String,
    pub methods: Vec<String>,
    pub capabilities: Vec<Capability>,
}

/// `AgentEvent` is a lifecycle notification published by the agent or its plugins
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct AgentEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,

    #[serde(rename = "emittedAt")]
    pub emitted_at: DateTime<Utc>,
}

impl AgentEvent {
    pub fn new(kind: &str, data: Value) -> Self {
        Self {
            kind: kind.to_string(),
            data,
            emitted_at: Utc::now(),
        }
    }
}
