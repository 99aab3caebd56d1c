//! `identity` provides everything needed to work with identifiers
//!
//! - [`Document`], the resolved description of an identifier
//! - [`Resolver`], resolves an identifier into its document
//! - [`KeyStore`], holds private key material, used to sign, to agree and to decrypt
//! - [`IdentifierManager`], provisions local identifiers
pub mod types;
pub use types::{KeyInfo, KeyStore, KeyStoreError, KeyType, ResolutionError, Resolver, WrappedKey};

pub mod document;
pub use document::{did_of, Document, Jwk, Service, VerificationMethod};

mod resolver;
pub use resolver::{parse_did, MemoryResolver, UniversalResolver};

mod keystore;
pub use keystore::LocalKeyStore;

mod manager;
pub use manager::{IdentifierManager, AGREEMENT_KEY_FRAGMENT, SIGNING_KEY_FRAGMENT};

mod plugin;
pub use plugin::{KeyManagerPlugin, ResolverPlugin};
