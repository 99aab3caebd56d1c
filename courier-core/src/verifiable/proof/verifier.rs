use prople_crypto::eddsa::pubkey::PubKey;

use prople_did_core::doc::types::{Doc, PublicKeyDecoded};
use prople_did_core::verifiable::proof::types::{ProofPurpose, Proofable};
use prople_did_core::verifiable::proof::DataIntegrityEddsaJcs2022;

use super::types::ProofError;

pub struct Verifier;

impl Verifier {
    pub fn verify_proof<TDoc>(secured: TDoc, pubkey: PubKey) -> Result<(), ProofError>
    where
        TDoc: Proofable,
    {
        let bytes_parsed = secured
            .to_json()
            .map_err(|err| ProofError::VerificationError(err.to_string()))?
            .to_bytes();

        let proof_integrity = DataIntegrityEddsaJcs2022::<TDoc>::new().build();

        proof_integrity
            .verify_proof(pubkey, bytes_parsed, ProofPurpose::AssertionMethod)
            .map_err(|err| ProofError::VerificationError(err.to_string()))
            .and_then(|val| match val.verified {
                true => Ok(()),
                _ => Err(ProofError::VerificationError(
                    "given proof not verified".to_string(),
                )),
            })
    }

    /// `verify_with_doc` accepts the proof when any `EdDSA` assertion key of the
    /// signer document verifies it
    pub fn verify_with_doc<TDoc>(secured: &TDoc, doc: Doc) -> Result<(), ProofError>
    where
        TDoc: Proofable + Clone,
    {
        let assertions = doc.assertion.ok_or(ProofError::VerificationError(
            "assertion key not found".to_string(),
        ))?;

        let verified = assertions
            .iter()
            .filter_map(|val| val.decode_pub_key().ok())
            .any(|decoded| match decoded {
                PublicKeyDecoded::EdDSA(pubkey) => {
                    Self::verify_proof(secured.clone(), pubkey).is_ok()
                }
                _ => false,
            });

        match verified {
            true => Ok(()),
            false => Err(ProofError::VerificationError(
                "signature invalid".to_string(),
            )),
        }
    }
}
