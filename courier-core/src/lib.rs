//! `prople-courier-core` is the core runtime of the `prople/courier` agent.
//!
//! The crate is split into several domains:
//!
//! - `agent`, aggregates capability plugins into a single dispatch surface
//! - `message`, an ordered chain of handlers used to classify inbound messages
//! - `identity`, identifier documents, resolvers and local key material
//! - `didcomm`, the `DIDComm Messaging` pack/unpack engine and its transports
//! - `protocols`, request/response protocols correlated by thread id
//! - `store`, the data store contract consumed by protocol handlers
//! - `verifiable`, proof building and verification for `VC` and `VP`
pub mod agent;
pub mod didcomm;
pub mod identity;
pub mod message;
pub mod protocols;
pub mod store;
pub mod verifiable;

#[cfg(test)]
pub(crate) mod fixtures;
