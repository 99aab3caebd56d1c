use rst_common::standard::chrono::Utc;
use rst_common::standard::uuid::Uuid;

use prople_crypto::eddsa::keypair::KeyPair;

use prople_did_core::keys::IdentityPrivateKeyPairs;
use prople_did_core::verifiable::objects::Proof;
use prople_did_core::verifiable::proof::types::{ProofPurpose, Proofable};
use prople_did_core::verifiable::proof::DataIntegrityEddsaJcs2022;

use super::types::ProofError;

/// `Builder` secures a credential or a presentation with an `eddsa-jcs-2022` proof
pub struct Builder;

impl Builder {
    /// `build_proof` signs `unsecured` with the assertion key of the given private keys
    ///
    /// The assertion key is stored encrypted, `password` is used to decrypt it
    pub fn build_proof<TDoc>(
        unsecured: TDoc,
        password: String,
        doc_private_keys: IdentityPrivateKeyPairs,
    ) -> Result<Option<Proof>, ProofError>
    where
        TDoc: Proofable,
    {
        let keypair = Self::assertion_keypair(password, doc_private_keys)?;
        let proof_integrity = DataIntegrityEddsaJcs2022::<TDoc>::new().build();

        let mut proof = Proof::new(Uuid::new_v4().to_string());
        proof.purpose(ProofPurpose::AssertionMethod.to_string());
        proof.created(Utc::now().to_string());

        let integrity = proof_integrity
            .add_proof(keypair, unsecured, proof)
            .map_err(|err| ProofError::BuildError(err.to_string()))?;

        Ok(integrity.get_proof())
    }

    fn assertion_keypair(
        password: String,
        doc_private_keys: IdentityPrivateKeyPairs,
    ) -> Result<KeyPair, ProofError> {
        let pem_bytes = doc_private_keys
            .assertion
            .map(|val| {
                val.decrypt_verification(password)
                    .map_err(|err| ProofError::BuildError(err.to_string()))
            })
            .ok_or(ProofError::BuildError(
                "assertion private key is missing".to_string(),
            ))??;

        let pem =
            String::from_utf8(pem_bytes).map_err(|err| ProofError::BuildError(err.to_string()))?;

        KeyPair::from_pem(pem).map_err(|err| ProofError::BuildError(err.to_string()))
    }
}
