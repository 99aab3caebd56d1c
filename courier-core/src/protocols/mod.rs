//! `protocols` implements the request/response protocols spoken between agents
//!
//! Each protocol is served by a [`crate::message::MessageHandler`] for its inbound
//! messages and, when it initiates exchanges, by a plugin method. Outbound requests
//! open an [`Exchange`] keyed by their thread id, inbound responses close it.
pub mod types;
pub use types::ExchangeError;

mod exchange;
pub use exchange::{Exchange, ExchangeStore};

mod outbound;

pub mod trust_ping;
pub use trust_ping::{TrustPingHandler, TrustPingPlugin};

pub mod sdr;
pub use sdr::{SelectiveDisclosureHandler, SelectiveDisclosurePlugin};

mod credential;
pub use credential::CredentialHandler;
