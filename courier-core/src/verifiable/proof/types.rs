use rst_common::with_errors::thiserror::{self, Error};

use crate::identity::types::ResolutionError;

#[derive(Debug, PartialEq, Error, Clone)]
pub enum ProofError {
    #[error("build error: {0}")]
    BuildError(String),

    #[error("verification error: {0}")]
    VerificationError(String),

    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),
}
