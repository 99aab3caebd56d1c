use std::collections::HashMap;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_tokio::tokio::sync::RwLock;

use prople_did_core::doc::types::Doc;

use crate::identity::{parse_did, ResolutionError};

/// `DocResolver` resolves the `prople` DID document holding assertion keys
///
/// It's kept apart from [`crate::identity::Resolver`], credentials are signed
/// with `prople` identities while messaging keys live in the local key store
#[async_trait]
pub trait DocResolver: Send + Sync {
    async fn resolve_doc(&self, did: &str) -> Result<Doc, ResolutionError>;
}

#[derive(Default)]
pub struct MemoryDocResolver {
    docs: RwLock<HashMap<String, Doc>>,
}

impl MemoryDocResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, did: &str, doc: Doc) {
        let mut docs = self.docs.write().await;
        docs.insert(did.to_string(), doc);
    }
}

#[async_trait]
impl DocResolver for MemoryDocResolver {
    async fn resolve_doc(&self, did: &str) -> Result<Doc, ResolutionError> {
        let did = parse_did(did)?;
        let docs = self.docs.read().await;
        docs.get(did)
            .cloned()
            .ok_or(ResolutionError::NotFound(did.to_string()))
    }
}
