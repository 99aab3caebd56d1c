use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use super::document::Document;

/// `ResolutionError` is the failure of resolving an identifier into its [`Document`]
#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum ResolutionError {
    #[error("identifier not found: {0}")]
    NotFound(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("resolver unavailable: {0}")]
    ResolverUnavailable(String),
}

/// `KeyStoreError` is the failure of any operation against local key material
#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum KeyStoreError {
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("decrypt error: {0}")]
    DecryptError(String),
}

/// `KeyType` is the set of key types a key store is able to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub enum KeyType {
    Ed25519,
    X25519,
}

impl KeyType {
    pub fn curve(&self) -> &str {
        match self {
            KeyType::Ed25519 => "Ed25519",
            KeyType::X25519 => "X25519",
        }
    }
}

/// `KeyInfo` is the public part of a managed key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct KeyInfo {
    pub kid: String,

    #[serde(rename = "type")]
    pub key_type: KeyType,

    #[serde(rename = "publicKey")]
    pub public_key: Vec<u8>,
}

/// `WrappedKey` is a content encryption key wrapped for a single recipient
///
/// The recipient derives the key wrapping key from the ephemeral public key and,
/// for sender authenticated envelopes, from the sender static public key
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedKey {
    pub alg: String,
    pub epk: [u8; 32],
    pub sender: Option<[u8; 32]>,
    pub nonce: Vec<u8>,
    pub encrypted_key: Vec<u8>,
}

/// `Resolver` resolves an identifier into its [`Document`]
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, did: &str) -> Result<Document, ResolutionError>;
}

/// `KeyStore` holds private key material and never exposes it
///
/// Implementers must guard concurrent access to their own key material
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn available_key_refs(&self) -> Vec<String>;
    async fn public_key(&self, key_ref: &str) -> Result<KeyInfo, KeyStoreError>;
    async fn sign(&self, key_ref: &str, payload: &[u8]) -> Result<Vec<u8>, KeyStoreError>;

    /// `agree` computes a static-static key agreement between the managed key and a peer
    async fn agree(&self, key_ref: &str, peer: &[u8; 32]) -> Result<[u8; 32], KeyStoreError>;

    /// `decrypt` unwraps a content encryption key addressed to the managed key
    async fn decrypt(&self, key_ref: &str, wrapped: &WrappedKey)
        -> Result<Vec<u8>, KeyStoreError>;
}
