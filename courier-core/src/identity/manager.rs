use std::sync::Arc;

use rst_common::with_logging::log::info;

use super::document::{Document, VerificationMethod};
use super::keystore::LocalKeyStore;
use super::resolver::MemoryResolver;
use super::types::{KeyStoreError, KeyType};

pub const SIGNING_KEY_FRAGMENT: &str = "key-1";
pub const AGREEMENT_KEY_FRAGMENT: &str = "key-x25519-1";

/// `IdentifierManager` provisions local identifiers
///
/// Each identifier receives an `Ed25519` signing key and an `X25519` key agreement key.
/// Its document is published into the shared [`MemoryResolver`]
#[derive(Clone)]
pub struct IdentifierManager {
    keystore: Arc<LocalKeyStore>,
    resolver: Arc<MemoryResolver>,
}

impl IdentifierManager {
    pub fn new(keystore: Arc<LocalKeyStore>, resolver: Arc<MemoryResolver>) -> Self {
        Self { keystore, resolver }
    }

    pub async fn create(&self, did: &str, endpoint: Option<String>) -> Result<Document, KeyStoreError> {
        let signing = self
            .keystore
            .create(&format!("{}#{}", did, SIGNING_KEY_FRAGMENT), KeyType::Ed25519)
            .await?;

        let agreement = self
            .keystore
            .create(&format!("{}#{}", did, AGREEMENT_KEY_FRAGMENT), KeyType::X25519)
            .await?;

        let mut doc = Document::new(did);
        doc.add_authentication(VerificationMethod::new(did, &signing))
            .add_key_agreement(VerificationMethod::new(did, &agreement));

        if let Some(service_endpoint) = endpoint {
            doc.add_messaging_service(&service_endpoint);
        }

        self.resolver.insert(doc.clone()).await;
        info!("identifier {} provisioned", did);

        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::with_tokio::tokio;

    use crate::identity::types::{KeyStore, Resolver};

    #[tokio::test]
    async fn test_create_identifier() {
        let keystore = Arc::new(LocalKeyStore::new());
        let resolver = Arc::new(MemoryResolver::new());
        let manager = IdentifierManager::new(keystore.clone(), resolver.clone());

        let doc = manager
            .create("did:example:alice", Some("local://alice".to_string()))
            .await;
        assert!(!doc.is_err());

        let resolved = resolver.resolve("did:example:alice").await.unwrap();
        assert_eq!(resolved, doc.unwrap());
        assert_eq!(resolved.authentication_methods().len(), 1);
        assert_eq!(resolved.key_agreement_methods().len(), 1);
        assert_eq!(resolved.messaging_endpoint(), Some("local://alice".to_string()));

        let refs = keystore.available_key_refs().await;
        assert_eq!(refs.len(), 2);
    }

    #[tokio::test]
    async fn test_create_identifier_twice() {
        let manager = IdentifierManager::new(
            Arc::new(LocalKeyStore::new()),
            Arc::new(MemoryResolver::new()),
        );

        let _ = manager.create("did:example:alice", None).await.unwrap();
        let duplicate = manager.create("did:example:alice", None).await;
        assert!(matches!(duplicate, Err(KeyStoreError::DuplicateKey(_))))
    }
}
