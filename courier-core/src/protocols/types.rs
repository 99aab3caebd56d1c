use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

pub const TRUST_PING_TYPE: &str = "https://didcomm.org/trust-ping/2.0/ping";
pub const TRUST_PING_RESPONSE_TYPE: &str = "https://didcomm.org/trust-ping/2.0/ping-response";

pub const SDR_REQUEST_TYPE: &str = "https://prople.network/selective-disclosure/1.0/request";
pub const SDR_RESPONSE_TYPE: &str = "https://prople.network/selective-disclosure/1.0/response";

pub const CREDENTIAL_TYPE: &str = "https://prople.network/credential-exchange/1.0/credential";
pub const PRESENTATION_TYPE: &str = "https://prople.network/credential-exchange/1.0/presentation";

/// Types given to raw `W3C` objects received outside of any envelope
pub const W3C_VC_TYPE: &str = "w3c.vc";
pub const W3C_VP_TYPE: &str = "w3c.vp";

pub const PROTOCOL_TRUST_PING: &str = "trust-ping";
pub const PROTOCOL_SELECTIVE_DISCLOSURE: &str = "selective-disclosure";

pub const META_TRUST_PING_RESPONSE_SENT: &str = "TrustPingResponseSent";
pub const META_TRUST_PING_RESPONSE_FAILED: &str = "TrustPingResponseFailed";
pub const META_TRUST_PING_RESPONSE_RECEIVED: &str = "TrustPingResponseReceived";
pub const META_TRUST_PING_RESPONSE_REJECTED: &str = "TrustPingResponseRejected";

pub const META_SDR_RESPONSE_SENT: &str = "SelectiveDisclosureResponseSent";
pub const META_SDR_RESPONSE_FAILED: &str = "SelectiveDisclosureResponseFailed";
pub const META_SDR_RESPONSE_RECEIVED: &str = "SelectiveDisclosureResponseReceived";
pub const META_SDR_RESPONSE_REJECTED: &str = "SelectiveDisclosureResponseRejected";

pub const META_CREDENTIAL_VERIFIED: &str = "CredentialVerified";
pub const META_CREDENTIAL_VERIFICATION_FAILED: &str = "CredentialVerificationFailed";
pub const META_PRESENTATION_VERIFIED: &str = "PresentationVerified";
pub const META_PRESENTATION_VERIFICATION_FAILED: &str = "PresentationVerificationFailed";

pub const META_DATA_STORE_SAVE_FAILED: &str = "DataStoreSaveFailed";

/// `ExchangeError` is the failure of correlating a message with an open exchange
#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum ExchangeError {
    #[error("unknown thread: {0}")]
    UnknownThread(String),

    #[error("thread already open: {0}")]
    ThreadAlreadyOpen(String),

    #[error("exchange expired: {0}")]
    Expired(String),

    #[error("response from unexpected peer: {0}")]
    PeerMismatch(String),

    #[error("unauthenticated response: {0}")]
    Unauthenticated(String),
}
