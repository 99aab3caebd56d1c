use std::collections::HashMap;
use std::sync::Arc;

use ed25519_dalek::{Signer, SigningKey};
use rand_core::OsRng;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::debug;
use rst_common::with_tokio::tokio::sync::{Mutex, RwLock};

use crate::didcomm::crypto::{self, generate_ephemeral, x25519_agree};

use super::types::{KeyInfo, KeyStore, KeyStoreError, KeyType, WrappedKey};

enum Secret {
    Ed25519(SigningKey),
    X25519([u8; 32]),
}

struct ManagedKey {
    info: KeyInfo,
    secret: Secret,
}

/// `LocalKeyStore` keeps generated keys in memory
///
/// Each key lives behind its own lock, operations on a single key are serialized
/// while operations over different keys run concurrently
#[derive(Default)]
pub struct LocalKeyStore {
    keys: RwLock<HashMap<String, Arc<Mutex<ManagedKey>>>>,
}

impl LocalKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `create` generates a new key identified by `kid`
    pub async fn create(&self, kid: &str, key_type: KeyType) -> Result<KeyInfo, KeyStoreError> {
        let mut keys = self.keys.write().await;
        if keys.contains_key(kid) {
            return Err(KeyStoreError::DuplicateKey(kid.to_string()));
        }

        let (public_key, secret) = match key_type {
            KeyType::Ed25519 => {
                let signing = SigningKey::generate(&mut OsRng);
                (
                    signing.verifying_key().to_bytes().to_vec(),
                    Secret::Ed25519(signing),
                )
            }
            KeyType::X25519 => {
                let (secret, public) = generate_ephemeral();
                (public.to_vec(), Secret::X25519(secret))
            }
        };

        let info = KeyInfo {
            kid: kid.to_string(),
            key_type,
            public_key,
        };

        debug!("creating key {} of type {:?}", kid, key_type);
        keys.insert(
            kid.to_string(),
            Arc::new(Mutex::new(ManagedKey {
                info: info.clone(),
                secret,
            })),
        );

        Ok(info)
    }

    pub async fn list(&self) -> Vec<KeyInfo> {
        let keys = self.keys.read().await;
        let mut infos = Vec::new();
        for key in keys.values() {
            infos.push(key.lock().await.info.clone());
        }

        infos.sort_by(|a, b| a.kid.cmp(&b.kid));
        infos
    }

    async fn key(&self, key_ref: &str) -> Result<Arc<Mutex<ManagedKey>>, KeyStoreError> {
        let keys = self.keys.read().await;
        keys.get(key_ref)
            .cloned()
            .ok_or(KeyStoreError::KeyNotFound(key_ref.to_string()))
    }
}

#[async_trait]
impl KeyStore for LocalKeyStore {
    async fn available_key_refs(&self) -> Vec<String> {
        let keys = self.keys.read().await;
        let mut refs: Vec<String> = keys.keys().cloned().collect();
        refs.sort();
        refs
    }

    async fn public_key(&self, key_ref: &str) -> Result<KeyInfo, KeyStoreError> {
        let key = self.key(key_ref).await?;
        let managed = key.lock().await;
        Ok(managed.info.clone())
    }

    async fn sign(&self, key_ref: &str, payload: &[u8]) -> Result<Vec<u8>, KeyStoreError> {
        let key = self.key(key_ref).await?;
        let managed = key.lock().await;
        match &managed.secret {
            Secret::Ed25519(signing) => Ok(signing.sign(payload).to_bytes().to_vec()),
            Secret::X25519(_) => Err(KeyStoreError::UnsupportedAlgorithm(format!(
                "{} is not a signing key",
                key_ref
            ))),
        }
    }

    async fn agree(&self, key_ref: &str, peer: &[u8; 32]) -> Result<[u8; 32], KeyStoreError> {
        let key = self.key(key_ref).await?;
        let managed = key.lock().await;
        match &managed.secret {
            Secret::X25519(secret) => Ok(x25519_agree(secret, peer)),
            Secret::Ed25519(_) => Err(KeyStoreError::UnsupportedAlgorithm(format!(
                "{} is not a key agreement key",
                key_ref
            ))),
        }
    }

    async fn decrypt(
        &self,
        key_ref: &str,
        wrapped: &WrappedKey,
    ) -> Result<Vec<u8>, KeyStoreError> {
        let key = self.key(key_ref).await?;
        let managed = key.lock().await;
        let secret = match &managed.secret {
            Secret::X25519(secret) => secret,
            Secret::Ed25519(_) => {
                return Err(KeyStoreError::UnsupportedAlgorithm(format!(
                    "{} is not a key agreement key",
                    key_ref
                )))
            }
        };

        let recipient: [u8; 32] = managed
            .info
            .public_key
            .clone()
            .try_into()
            .map_err(|_| KeyStoreError::InvalidKey(key_ref.to_string()))?;

        let mut z = x25519_agree(secret, &wrapped.epk).to_vec();
        if let Some(sender) = &wrapped.sender {
            z.extend_from_slice(&x25519_agree(secret, sender));
        }

        let kek = crypto::derive_kek(
            &wrapped.alg,
            &z,
            &wrapped.epk,
            &recipient,
            wrapped.sender.as_ref(),
        )
        .map_err(|err| KeyStoreError::DecryptError(err.to_string()))?;

        crypto::unwrap_key(&kek, &wrapped.nonce, &wrapped.encrypted_key)
            .map_err(|err| KeyStoreError::DecryptError(err.to_string()))
    }
}
