use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use crate::identity::types::{KeyStoreError, ResolutionError};
use crate::message::types::TypedMessage;

pub const MEDIA_TYPE_PLAIN: &str = "application/didcomm-plain+json";
pub const MEDIA_TYPE_SIGNED: &str = "application/didcomm-signed+json";
pub const MEDIA_TYPE_ENCRYPTED: &str = "application/didcomm-encrypted+json";

pub const ALG_EDDSA: &str = "EdDSA";
pub const ALG_AUTHCRYPT: &str = "ECDH-1PU+C20PKW";
pub const ALG_ANONCRYPT: &str = "ECDH-ES+C20PKW";
pub const ENC_C20P: &str = "C20P";

#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum TransportError {
    #[error("no transport: {0}")]
    NoTransport(String),

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("endpoint unavailable: {0}")]
    EndpointUnavailable(String),
}

#[derive(Debug, PartialEq, Error, Clone)]
pub enum DIDCommError {
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("decryption error: {0}")]
    Decryption(String),

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("signature verification error: {0}")]
    SignatureVerification(String),

    #[error("unsupported packing: {0}")]
    UnsupportedPacking(String),

    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("json error: {0}")]
    JSONError(String),
}

impl From<KeyStoreError> for DIDCommError {
    fn from(value: KeyStoreError) -> Self {
        match value {
            KeyStoreError::KeyNotFound(msg) => DIDCommError::KeyNotFound(msg),
            KeyStoreError::UnsupportedAlgorithm(msg) => DIDCommError::UnsupportedAlgorithm(msg),
            KeyStoreError::DecryptError(msg) => DIDCommError::Decryption(msg),
            KeyStoreError::DuplicateKey(msg) | KeyStoreError::InvalidKey(msg) => {
                DIDCommError::KeyNotFound(msg)
            }
        }
    }
}

/// `Packing` is the closed set of envelope formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum Packing {
    None,
    Jws,
    Authcrypt,
    Anoncrypt,
}

impl Packing {
    pub fn media_type(&self) -> &str {
        match self {
            Packing::None => MEDIA_TYPE_PLAIN,
            Packing::Jws => MEDIA_TYPE_SIGNED,
            Packing::Authcrypt | Packing::Anoncrypt => MEDIA_TYPE_ENCRYPTED,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, Packing::Authcrypt | Packing::Anoncrypt)
    }

    /// `is_authenticated` tells whether the envelope proves who its sender is
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Packing::Jws | Packing::Authcrypt)
    }

    pub fn algorithm(&self) -> Option<&str> {
        match self {
            Packing::None => None,
            Packing::Jws => Some(ALG_EDDSA),
            Packing::Authcrypt => Some(ALG_AUTHCRYPT),
            Packing::Anoncrypt => Some(ALG_ANONCRYPT),
        }
    }
}

impl fmt::Display for Packing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Packing::None => "none",
            Packing::Jws => "jws",
            Packing::Authcrypt => "authcrypt",
            Packing::Anoncrypt => "anoncrypt",
        };

        write!(f, "{}", name)
    }
}

impl FromStr for Packing {
    type Err = DIDCommError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Packing::None),
            "jws" => Ok(Packing::Jws),
            "authcrypt" => Ok(Packing::Authcrypt),
            "anoncrypt" => Ok(Packing::Anoncrypt),
            _ => Err(DIDCommError::UnsupportedPacking(s.to_string())),
        }
    }
}

/// `UnpackMetadata` describes how an unpacked message was protected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct UnpackMetadata {
    pub packing: Packing,

    /// Envelope layers, outermost first
    pub envelopes: Vec<Packing>,
    pub authenticated: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub signer: Option<String>,

    #[serde(rename = "senderKid")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub sender_kid: Option<String>,

    #[serde(rename = "recipientKid")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub recipient_kid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct UnpackedMessage {
    pub message: TypedMessage,
    pub metadata: UnpackMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct TransportAck {
    pub transport: String,
    pub endpoint: String,

    #[serde(rename = "messageId")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub message_id: Option<String>,
}

/// `Transport` delivers packed messages to a service endpoint
///
/// Implementers never retry, a failed delivery is reported back to the caller
#[async_trait]
pub trait Transport: Send + Sync {
    fn id(&self) -> String;
    fn is_match(&self, endpoint: &str) -> bool;
    async fn send(&self, packed: &str, endpoint: &str) -> Result<TransportAck, TransportError>;
}

pub(crate) fn encode_b64(input: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

pub(crate) fn decode_b64(input: &str) -> Result<Vec<u8>, DIDCommError> {
    URL_SAFE_NO_PAD
        .decode(input.as_bytes())
        .map_err(|err| DIDCommError::MalformedEnvelope(err.to_string()))
}
