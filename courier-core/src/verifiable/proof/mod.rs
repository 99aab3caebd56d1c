//! `proof` builds and verifies the `eddsa-jcs-2022` data integrity proofs of
//! credentials and presentations
pub mod builder;
pub mod types;
pub mod verifier;
