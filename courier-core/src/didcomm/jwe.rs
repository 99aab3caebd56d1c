//! Encrypted envelopes, JWE general JSON serialization
//!
//! All recipients share a single ephemeral key. The content encryption key is
//! wrapped once per recipient key agreement key.
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;
use rst_common::with_logging::log::debug;

use crate::didcomm::crypto::{self, Sealed};
use crate::identity::document::{did_of, Jwk};
use crate::identity::types::{KeyStore, KeyType, Resolver, WrappedKey};

use super::types::{
    decode_b64, encode_b64, DIDCommError, Packing, ALG_ANONCRYPT, ALG_AUTHCRYPT, ENC_C20P,
    MEDIA_TYPE_ENCRYPTED,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub(crate) struct Jwe {
    pub protected: String,
    pub recipients: Vec<JweRecipient>,
    pub iv: String,
    pub ciphertext: String,
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub(crate) struct JweRecipient {
    pub header: RecipientHeader,
    pub encrypted_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub(crate) struct RecipientHeader {
    pub kid: String,
    pub nonce: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub(crate) struct JweHeader {
    pub typ: String,
    pub alg: String,
    pub enc: String,
    pub epk: Jwk,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub skid: Option<String>,

    /// Media type of the encrypted payload when it is another envelope
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub cty: Option<String>,
}

impl JweHeader {
    pub fn packing(&self) -> Result<Packing, DIDCommError> {
        match self.alg.as_str() {
            ALG_AUTHCRYPT => Ok(Packing::Authcrypt),
            ALG_ANONCRYPT => Ok(Packing::Anoncrypt),
            alg => Err(DIDCommError::UnsupportedAlgorithm(alg.to_string())),
        }
    }
}

/// `RecipientKey` is a recipient key agreement key
#[derive(Debug, Clone)]
pub(crate) struct RecipientKey {
    pub kid: String,
    pub public: [u8; 32],
}

/// `SenderKey` is the sender key agreement key used by authcrypt
#[derive(Debug, Clone)]
pub(crate) struct SenderKey {
    pub kid: String,
    pub public: [u8; 32],
}

pub(crate) struct Decrypted {
    pub plaintext: Vec<u8>,
    pub packing: Packing,
    pub recipient_kid: String,
    pub sender_kid: Option<String>,
}

pub(crate) fn parse_header(protected: &str) -> Result<JweHeader, DIDCommError> {
    let header_bytes = decode_b64(protected)?;
    serde_json::from_slice(&header_bytes)
        .map_err(|err| DIDCommError::MalformedEnvelope(err.to_string()))
}

pub(crate) async fn encrypt(
    payload: &[u8],
    recipients: &[RecipientKey],
    sender: Option<&SenderKey>,
    cty: Option<&str>,
    keystore: &dyn KeyStore,
) -> Result<String, DIDCommError> {
    if recipients.is_empty() {
        return Err(DIDCommError::KeyNotFound(
            "missing recipient key agreement keys".to_string(),
        ));
    }

    let alg = match sender {
        Some(_) => ALG_AUTHCRYPT,
        None => ALG_ANONCRYPT,
    };

    let (eph_secret, epk) = crypto::generate_ephemeral();
    let header = JweHeader {
        typ: MEDIA_TYPE_ENCRYPTED.to_string(),
        alg: alg.to_string(),
        enc: ENC_C20P.to_string(),
        epk: Jwk::new(KeyType::X25519, &epk),
        skid: sender.map(|key| key.kid.to_owned()),
        cty: cty.map(|media_type| media_type.to_string()),
    };

    let header_json =
        serde_json::to_vec(&header).map_err(|err| DIDCommError::JSONError(err.to_string()))?;
    let protected = encode_b64(header_json);

    let cek = crypto::random_key();
    let sealed = crypto::seal(&cek, payload, protected.as_bytes())
        .map_err(|err| DIDCommError::Encryption(err.to_string()))?;

    let mut entries = Vec::with_capacity(recipients.len());
    for recipient in recipients.iter() {
        let mut z = crypto::x25519_agree(&eph_secret, &recipient.public).to_vec();
        if let Some(sender_key) = sender {
            let static_z = keystore.agree(&sender_key.kid, &recipient.public).await?;
            z.extend_from_slice(&static_z);
        }

        let kek = crypto::derive_kek(
            alg,
            &z,
            &epk,
            &recipient.public,
            sender.map(|key| &key.public),
        )
        .map_err(|err| DIDCommError::Encryption(err.to_string()))?;

        let (nonce, wrapped) = crypto::wrap_key(&kek, &cek)
            .map_err(|err| DIDCommError::Encryption(err.to_string()))?;

        entries.push(JweRecipient {
            header: RecipientHeader {
                kid: recipient.kid.to_owned(),
                nonce: encode_b64(nonce),
            },
            encrypted_key: encode_b64(wrapped),
        });
    }

    let jwe = Jwe {
        protected,
        recipients: entries,
        iv: encode_b64(sealed.nonce),
        ciphertext: encode_b64(sealed.ciphertext),
        tag: encode_b64(sealed.tag),
    };

    serde_json::to_string(&jwe).map_err(|err| DIDCommError::JSONError(err.to_string()))
}

/// `decrypt` opens an envelope addressed to one of the local keys
///
/// Any failure to find a matching local key, to unwrap the content key or to
/// authenticate the ciphertext ends as [`DIDCommError::Decryption`]
pub(crate) async fn decrypt(
    raw: &str,
    keystore: &dyn KeyStore,
    resolver: &dyn Resolver,
) -> Result<Decrypted, DIDCommError> {
    let jwe: Jwe =
        serde_json::from_str(raw).map_err(|err| DIDCommError::MalformedEnvelope(err.to_string()))?;

    let header = parse_header(&jwe.protected)?;
    let packing = header.packing()?;
    if header.enc != ENC_C20P {
        return Err(DIDCommError::UnsupportedAlgorithm(header.enc));
    }

    let epk = header
        .epk
        .public_bytes()
        .map_err(|err| DIDCommError::MalformedEnvelope(err.to_string()))?;

    let sender = match packing {
        Packing::Authcrypt => {
            let skid = header.skid.as_ref().ok_or(DIDCommError::MalformedEnvelope(
                "authcrypt envelope without skid".to_string(),
            ))?;

            Some(resolve_sender(skid, resolver).await?)
        }
        _ => None,
    };

    let sealed = Sealed {
        nonce: decode_b64(&jwe.iv)?,
        ciphertext: decode_b64(&jwe.ciphertext)?,
        tag: decode_b64(&jwe.tag)?,
    };

    let local_refs = keystore.available_key_refs().await;
    for recipient in jwe.recipients.iter() {
        if !local_refs.contains(&recipient.header.kid) {
            continue;
        }

        let wrapped = WrappedKey {
            alg: header.alg.to_owned(),
            epk,
            sender: sender.as_ref().map(|key| key.public),
            nonce: decode_b64(&recipient.header.nonce)?,
            encrypted_key: decode_b64(&recipient.encrypted_key)?,
        };

        let cek = match keystore.decrypt(&recipient.header.kid, &wrapped).await {
            Ok(cek) => cek,
            Err(err) => {
                debug!("unable to unwrap key for {}: {}", recipient.header.kid, err);
                continue;
            }
        };

        let plaintext = crypto::open(&cek, &sealed, jwe.protected.as_bytes())
            .map_err(|err| DIDCommError::Decryption(err.to_string()))?;

        return Ok(Decrypted {
            plaintext,
            packing,
            recipient_kid: recipient.header.kid.to_owned(),
            sender_kid: sender.map(|key| key.kid),
        });
    }

    Err(DIDCommError::Decryption(
        "no local key matches any recipient".to_string(),
    ))
}

async fn resolve_sender(skid: &str, resolver: &dyn Resolver) -> Result<SenderKey, DIDCommError> {
    let doc = resolver.resolve(did_of(skid)).await?;
    let method = doc
        .key_agreement_methods()
        .into_iter()
        .find(|method| method.id == skid)
        .ok_or(DIDCommError::Decryption(format!(
            "unknown sender key: {}",
            skid
        )))?;

    let public = method
        .public_key_jwk
        .public_bytes()
        .map_err(|err| DIDCommError::Decryption(err.to_string()))?;

    Ok(SenderKey {
        kid: skid.to_string(),
        public,
    })
}
