//! Primitives shared by the envelope formats and the local key store
//!
//! Key agreement uses X25519, key wrapping and content encryption both use
//! ChaCha20-Poly1305 and the key wrapping key is derived with HKDF-SHA256.
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use curve25519_dalek::montgomery::MontgomeryPoint;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use hkdf::Hkdf;
use rand_core::{OsRng, RngCore};
use sha2::Sha256;

use rst_common::with_errors::thiserror::{self, Error};

pub const KEY_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;

const KDF_DOMAIN: &[u8] = b"prople-courier-didcomm-v1";

#[derive(Debug, PartialEq, Error, Clone)]
pub enum CryptoError {
    #[error("key derivation error: {0}")]
    KeyDerivation(String),

    #[error("encrypt error: {0}")]
    Encrypt(String),

    #[error("decrypt error: {0}")]
    Decrypt(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}

/// `Sealed` is the output of an authenticated encryption
#[derive(Debug, Clone, PartialEq)]
pub struct Sealed {
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

pub fn random_key() -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    key
}

/// `x25519_public` follows RFC 7748, the secret is clamped before use
pub fn x25519_public(secret: &[u8; 32]) -> [u8; 32] {
    MontgomeryPoint::mul_base_clamped(*secret).to_bytes()
}

pub fn x25519_agree(secret: &[u8; 32], peer: &[u8; 32]) -> [u8; 32] {
    MontgomeryPoint(*peer).mul_clamped(*secret).to_bytes()
}

/// `generate_ephemeral` returns a fresh X25519 `(secret, public)` pair
pub fn generate_ephemeral() -> ([u8; 32], [u8; 32]) {
    let secret = random_key();
    let public = x25519_public(&secret);
    (secret, public)
}

/// `derive_kek` derives the key wrapping key from the shared secret `z`
///
/// The info binds the algorithm, the ephemeral key, the recipient key and, when
/// present, the sender static key
pub fn derive_kek(
    alg: &str,
    z: &[u8],
    epk: &[u8; 32],
    recipient: &[u8; 32],
    sender: Option<&[u8; 32]>,
) -> Result<[u8; KEY_SIZE], CryptoError> {
    let mut info = Vec::with_capacity(alg.len() + 96);
    info.extend_from_slice(alg.as_bytes());
    info.extend_from_slice(epk);
    info.extend_from_slice(recipient);
    if let Some(sender_key) = sender {
        info.extend_from_slice(sender_key);
    }

    let hkdf = Hkdf::<Sha256>::new(Some(KDF_DOMAIN), z);
    let mut output = [0u8; KEY_SIZE];
    hkdf.expand(&info, &mut output)
        .map_err(|err| CryptoError::KeyDerivation(err.to_string()))?;

    Ok(output)
}

pub fn seal(key: &[u8; KEY_SIZE], plaintext: &[u8], aad: &[u8]) -> Result<Sealed, CryptoError> {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let mut output = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|err| CryptoError::Encrypt(err.to_string()))?;

    let tag = output.split_off(output.len() - TAG_SIZE);
    Ok(Sealed {
        nonce: nonce.to_vec(),
        ciphertext: output,
        tag,
    })
}

pub fn open(key: &[u8], sealed: &Sealed, aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if key.len() != KEY_SIZE {
        return Err(CryptoError::Decrypt("invalid key length".to_string()));
    }

    if sealed.nonce.len() != NONCE_SIZE || sealed.tag.len() != TAG_SIZE {
        return Err(CryptoError::Decrypt("invalid nonce or tag".to_string()));
    }

    let mut combined = Vec::with_capacity(sealed.ciphertext.len() + TAG_SIZE);
    combined.extend_from_slice(&sealed.ciphertext);
    combined.extend_from_slice(&sealed.tag);

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(
            Nonce::from_slice(&sealed.nonce),
            Payload {
                msg: &combined,
                aad,
            },
        )
        .map_err(|err| CryptoError::Decrypt(err.to_string()))
}

/// `wrap_key` seals a content encryption key, the tag is appended to the wrapped key
pub fn wrap_key(kek: &[u8; KEY_SIZE], cek: &[u8]) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
    let sealed = seal(kek, cek, &[])?;
    let mut wrapped = sealed.ciphertext;
    wrapped.extend_from_slice(&sealed.tag);
    Ok((sealed.nonce, wrapped))
}

pub fn unwrap_key(kek: &[u8; KEY_SIZE], nonce: &[u8], wrapped: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if wrapped.len() < TAG_SIZE {
        return Err(CryptoError::Decrypt("wrapped key too short".to_string()));
    }

    let (ciphertext, tag) = wrapped.split_at(wrapped.len() - TAG_SIZE);
    let sealed = Sealed {
        nonce: nonce.to_vec(),
        ciphertext: ciphertext.to_vec(),
        tag: tag.to_vec(),
    };

    open(kek, &sealed, &[])
}

pub fn verify_ed25519(public: &[u8; 32], payload: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let key = VerifyingKey::from_bytes(public)
        .map_err(|err| CryptoError::InvalidSignature(err.to_string()))?;
    let sig = Signature::from_slice(signature)
        .map_err(|err| CryptoError::InvalidSignature(err.to_string()))?;

    key.verify(payload, &sig)
        .map_err(|err| CryptoError::InvalidSignature(err.to_string()))
}
