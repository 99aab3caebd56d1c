//! `agent` is the dispatch surface of the runtime
//!
//! An [`Agent`] is composed from a list of [`Plugin`]. Each plugin declares its methods
//! grouped by a closed [`Capability`] set. All declared methods are merged into a single
//! immutable method table when the agent is built, any collision is rejected at startup.
//!
//! Each execution receives its own [`Context`], which carries the agent itself so plugins
//! are able to compose each other's methods without knowing about each other.
pub mod types;
pub use types::{
    AgentError, AgentEvent, Capability, MethodFn, MethodOutput, MethodSpec, Plugin,
    PluginError, PluginInfo,
};
pub use types::{
    EVENT_DIDCOMM_MESSAGE_SENT, EVENT_DID_EXECUTE, EVENT_EXECUTION_FAILED, EVENT_MESSAGE_HANDLED,
};
pub use types::{
    METHOD_DATA_STORE_QUERY, METHOD_DATA_STORE_SAVE, METHOD_DID_MANAGER_CREATE,
    METHOD_GET_DIDCOMM_MESSAGE_MEDIA_TYPE, METHOD_HANDLE_MESSAGE, METHOD_KEY_MANAGER_CREATE,
    METHOD_KEY_MANAGER_GET_KEYS, METHOD_KEY_MANAGER_SIGN, METHOD_PACK_DIDCOMM_MESSAGE,
    METHOD_RESOLVE_DID, METHOD_SEND_DIDCOMM_MESSAGE, METHOD_SEND_SELECTIVE_DISCLOSURE_REQUEST,
    METHOD_SEND_TRUST_PING, METHOD_UNPACK_DIDCOMM_MESSAGE,
};

mod agent;
pub use agent::{Agent, AgentBuilder};

mod context;
pub use context::Context;

pub mod helpers;
