//! `didcomm` implements the `DIDComm Messaging` envelopes
//!
//! Supported packings:
//!
//! - `none`, plaintext json
//! - `jws`, signed with an `Ed25519` authentication key
//! - `authcrypt`, encrypted and authenticated with the sender key agreement key
//! - `anoncrypt`, encrypted for the recipients only, the sender stays anonymous
//!
//! Keys are resolved through the identifier documents. Packed messages are delivered
//! through pluggable [`Transport`] implementations.
pub mod crypto;

pub mod types;
pub use types::{
    DIDCommError, Packing, Transport, TransportAck, TransportError, UnpackMetadata,
    UnpackedMessage,
};
pub use types::{MEDIA_TYPE_ENCRYPTED, MEDIA_TYPE_PLAIN, MEDIA_TYPE_SIGNED};

mod jwe;
mod jws;

mod engine;
pub use engine::{detect_packing, DIDComm};

mod transport;
pub use transport::{LoopbackTransport, LOOPBACK_SCHEME};

mod handler;
pub use handler::{DIDCommMessageHandler, META_DIDCOMM, META_DIDCOMM_SENDER};

mod plugin;
pub use plugin::DIDCommPlugin;
