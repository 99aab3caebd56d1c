use std::collections::HashMap;
use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::debug;
use rst_common::with_tokio::tokio::sync::RwLock;

use super::document::{did_of, Document};
use super::types::{ResolutionError, Resolver};

/// `MemoryResolver` keeps documents in memory, keyed by their identifier
#[derive(Default)]
pub struct MemoryResolver {
    docs: RwLock<HashMap<String, Document>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, doc: Document) {
        let mut docs = self.docs.write().await;
        docs.insert(doc.id.clone(), doc);
    }

    pub async fn remove(&self, did: &str) -> Option<Document> {
        let mut docs = self.docs.write().await;
        docs.remove(did)
    }
}

#[async_trait]
impl Resolver for MemoryResolver {
    async fn resolve(&self, did: &str) -> Result<Document, ResolutionError> {
        let did = parse_did(did)?;
        let docs = self.docs.read().await;
        docs.get(did)
            .cloned()
            .ok_or(ResolutionError::NotFound(did.to_string()))
    }
}

/// `UniversalResolver` routes a resolution to the resolver registered for its DID method
#[derive(Default, Clone)]
pub struct UniversalResolver {
    methods: HashMap<String, Arc<dyn Resolver>>,
}

impl UniversalResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, method: &str, resolver: Arc<dyn Resolver>) -> &mut Self {
        self.methods.insert(method.to_string(), resolver);
        self
    }
}

#[async_trait]
impl Resolver for UniversalResolver {
    async fn resolve(&self, did: &str) -> Result<Document, ResolutionError> {
        let parsed = parse_did(did)?;
        let method = parsed.split(':').nth(1).unwrap_or_default();

        debug!("resolving {} through method {}", parsed, method);

        let resolver = self
            .methods
            .get(method)
            .ok_or(ResolutionError::ResolverUnavailable(format!(
                "no resolver for method: {}",
                method
            )))?;

        resolver.resolve(parsed).await
    }
}

/// `parse_did` validates a DID (or DID URL) and returns its identifier part
pub fn parse_did(did_url: &str) -> Result<&str, ResolutionError> {
    let did = did_of(did_url);
    let parts: Vec<&str> = did.splitn(3, ':').collect();
    match parts.as_slice() {
        ["did", method, id] if !method.is_empty() && !id.is_empty() => Ok(did),
        _ => Err(ResolutionError::InvalidIdentifier(did_url.to_string())),
    }
}
