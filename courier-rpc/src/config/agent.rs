use std::time::Duration;

use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

/// `Issuer` names a `prople` DID document trusted to verify credential proofs
///
/// `doc` is the path of the document JSON file
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct Issuer {
    pub did: String,
    pub doc: String,
}

/// `Agent` describes the local identifier served by the daemon
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Agent {
    pub(super) did: String,
    pub(super) endpoint: String,

    /// Lifetime of an open exchange, in seconds. Exchanges never expire when missing
    #[serde(default)]
    pub(super) exchange_ttl: Option<u64>,

    /// Credentials and presentations only verify against these documents
    #[serde(default)]
    pub(super) issuers: Vec<Issuer>,
}

impl Agent {
    pub fn get_identity(&self) -> (String, String) {
        (self.did.to_owned(), self.endpoint.to_owned())
    }

    pub fn get_exchange_ttl(&self) -> Option<Duration> {
        self.exchange_ttl.map(Duration::from_secs)
    }

    pub fn get_issuers(&self) -> &[Issuer] {
        &self.issuers
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            did: String::new(),
            endpoint: "local://courier".to_string(),
            exchange_ttl: None,
            issuers: Vec::new(),
        }
    }
}

impl ToValidate for Agent {
    fn validate(&self) -> Result<(), CommonError> {
        if !self.did.starts_with("did:") || self.did.split(':').count() < 3 {
            return Err(CommonError::ValidationError(format!(
                "agent: invalid did: {}",
                self.did
            )));
        }

        if self.endpoint.is_empty() {
            return Err(CommonError::ValidationError(
                "agent: missing endpoint".to_string(),
            ));
        }

        if self.exchange_ttl == Some(0) {
            return Err(CommonError::ValidationError(
                "agent: exchange_ttl must be greater than zero".to_string(),
            ));
        }

        for issuer in self.issuers.iter() {
            if !issuer.did.starts_with("did:") || issuer.doc.is_empty() {
                return Err(CommonError::ValidationError(format!(
                    "agent: invalid issuer: {}",
                    issuer.did
                )));
            }
        }

        Ok(())
    }
}
