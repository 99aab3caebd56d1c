use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::debug;

use prople_did_core::verifiable::objects::{VC, VP};

use super::proof::types::ProofError;
use super::proof::verifier::Verifier;
use super::resolver::DocResolver;

/// `CredentialVerifier` checks the proofs of received credentials and presentations
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify_credential(&self, vc: &VC) -> Result<(), ProofError>;
    async fn verify_presentation(&self, vp: &VP) -> Result<(), ProofError>;
}

/// `ProofCredentialVerifier` verifies a credential against its issuer assertion keys
/// and a presentation against its holder assertion keys
pub struct ProofCredentialVerifier {
    docs: Arc<dyn DocResolver>,
}

impl ProofCredentialVerifier {
    pub fn new(docs: Arc<dyn DocResolver>) -> Self {
        Self { docs }
    }
}

#[async_trait]
impl CredentialVerifier for ProofCredentialVerifier {
    async fn verify_credential(&self, vc: &VC) -> Result<(), ProofError> {
        debug!("verifying credential {} issued by {}", vc.id, vc.issuer);

        let doc = self.docs.resolve_doc(&vc.issuer).await?;
        Verifier::verify_with_doc(vc, doc)
    }

    async fn verify_presentation(&self, vp: &VP) -> Result<(), ProofError> {
        let holder = vp.holder.clone().ok_or(ProofError::VerificationError(
            "presentation without holder".to_string(),
        ))?;

        debug!("verifying presentation held by {}", holder);

        let doc = self.docs.resolve_doc(&holder).await?;
        Verifier::verify_with_doc(vp, doc)
    }
}
