pub mod method;
pub use method::{build_rpc_method, AgentMethod, RpcMethodBuilder};

mod param;
pub use param::Param;

mod handler;
pub use handler::AgentHandler;

mod manager;
pub use manager::{AgentService, Manager};

mod runtime;
pub use runtime::Runtime;
