//! Signed envelopes, JWS general JSON serialization with an embedded payload
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;

use crate::didcomm::crypto::verify_ed25519;
use crate::identity::document::did_of;
use crate::identity::types::{KeyStore, KeyType, Resolver};

use super::types::{decode_b64, encode_b64, DIDCommError, ALG_EDDSA, MEDIA_TYPE_SIGNED};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub(crate) struct Jws {
    pub payload: String,
    pub signatures: Vec<JwsSignature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub(crate) struct JwsSignature {
    pub protected: String,
    pub signature: String,
    pub header: JwsHeader,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub(crate) struct JwsHeader {
    pub kid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
struct ProtectedHeader {
    typ: String,
    alg: String,
    kid: String,
}

/// `Verified` is the output of a successful signature verification
pub(crate) struct Verified {
    pub payload: Vec<u8>,
    pub signer: String,
}

pub(crate) async fn sign(
    payload: &[u8],
    kid: &str,
    keystore: &dyn KeyStore,
) -> Result<String, DIDCommError> {
    let key = keystore.public_key(kid).await?;
    if key.key_type != KeyType::Ed25519 {
        return Err(DIDCommError::UnsupportedAlgorithm(format!(
            "{} is not an Ed25519 key",
            kid
        )));
    }

    let header = ProtectedHeader {
        typ: MEDIA_TYPE_SIGNED.to_string(),
        alg: ALG_EDDSA.to_string(),
        kid: kid.to_string(),
    };

    let header_json =
        serde_json::to_vec(&header).map_err(|err| DIDCommError::JSONError(err.to_string()))?;

    let protected = encode_b64(header_json);
    let encoded_payload = encode_b64(payload);
    let signing_input = format!("{}.{}", protected, encoded_payload);
    let signature = keystore.sign(kid, signing_input.as_bytes()).await?;

    let jws = Jws {
        payload: encoded_payload,
        signatures: vec![JwsSignature {
            protected,
            signature: encode_b64(signature),
            header: JwsHeader {
                kid: kid.to_string(),
            },
        }],
    };

    serde_json::to_string(&jws).map_err(|err| DIDCommError::JSONError(err.to_string()))
}

/// `verify` checks every signature of the envelope against the signer documents
///
/// A signer key must be referenced by the `authentication` or `assertionMethod`
/// relationship of its document
pub(crate) async fn verify(raw: &str, resolver: &dyn Resolver) -> Result<Verified, DIDCommError> {
    let jws: Jws =
        serde_json::from_str(raw).map_err(|err| DIDCommError::MalformedEnvelope(err.to_string()))?;

    if jws.signatures.is_empty() {
        return Err(DIDCommError::MalformedEnvelope(
            "missing signatures".to_string(),
        ));
    }

    let mut signer: Option<String> = None;
    for entry in jws.signatures.iter() {
        let header_bytes = decode_b64(&entry.protected)?;
        let header: ProtectedHeader = serde_json::from_slice(&header_bytes)
            .map_err(|err| DIDCommError::MalformedEnvelope(err.to_string()))?;

        if header.alg != ALG_EDDSA {
            return Err(DIDCommError::UnsupportedAlgorithm(header.alg));
        }

        let doc = resolver.resolve(did_of(&header.kid)).await?;
        let is_authorized = doc.authentication.contains(&header.kid)
            || doc.assertion_method.contains(&header.kid);

        let method = doc
            .find_method(&header.kid)
            .filter(|_| is_authorized)
            .ok_or(DIDCommError::SignatureVerification(format!(
                "unknown signer key: {}",
                header.kid
            )))?;

        let public = method
            .public_key_jwk
            .public_bytes()
            .map_err(|err| DIDCommError::SignatureVerification(err.to_string()))?;

        let signature = decode_b64(&entry.signature)?;
        let signing_input = format!("{}.{}", entry.protected, jws.payload);
        verify_ed25519(&public, signing_input.as_bytes(), &signature)
            .map_err(|err| DIDCommError::SignatureVerification(err.to_string()))?;

        if signer.is_none() {
            signer = Some(header.kid);
        }
    }

    let payload = decode_b64(&jws.payload)?;
    let signer = signer.ok_or(DIDCommError::MalformedEnvelope(
        "missing signer".to_string(),
    ))?;

    Ok(Verified { payload, signer })
}
