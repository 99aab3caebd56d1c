//! `verifiable` verifies the `W3C` credentials and presentations received by the agent
pub mod proof;
pub use proof::types::ProofError;

mod resolver;
pub use resolver::{DocResolver, MemoryDocResolver};

mod verifier;
pub use verifier::{CredentialVerifier, ProofCredentialVerifier};
