use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use rst_common::standard::serde::{self, Deserialize, Serialize};

use super::types::{KeyInfo, KeyStoreError, KeyType};

pub const VERIFICATION_METHOD_TYPE: &str = "JsonWebKey2020";
pub const SERVICE_DIDCOMM_MESSAGING: &str = "DIDCommMessaging";

/// `did_of` extracts the identifier part of a DID URL, dropping its path,
/// query and fragment
pub fn did_of(did_url: &str) -> &str {
    let end = did_url
        .find(|c: char| c == '#' || c == '?' || c == '/')
        .unwrap_or(did_url.len());

    &did_url[..end]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct Jwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
}

impl Jwk {
    pub fn new(key_type: KeyType, public_key: &[u8]) -> Self {
        Self {
            kty: "OKP".to_string(),
            crv: key_type.curve().to_string(),
            x: URL_SAFE_NO_PAD.encode(public_key),
        }
    }

    pub fn key_type(&self) -> Result<KeyType, KeyStoreError> {
        match (self.kty.as_str(), self.crv.as_str()) {
            ("OKP", "Ed25519") => Ok(KeyType::Ed25519),
            ("OKP", "X25519") => Ok(KeyType::X25519),
            (kty, crv) => Err(KeyStoreError::UnsupportedAlgorithm(format!(
                "{}/{}",
                kty, crv
            ))),
        }
    }

    pub fn public_bytes(&self) -> Result<[u8; 32], KeyStoreError> {
        let decoded = URL_SAFE_NO_PAD
            .decode(self.x.as_bytes())
            .map_err(|err| KeyStoreError::InvalidKey(err.to_string()))?;

        decoded
            .try_into()
            .map_err(|_| KeyStoreError::InvalidKey("public key must be 32 bytes".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct VerificationMethod {
    pub id: String,

    #[serde(rename = "type")]
    pub typ: String,
    pub controller: String,

    #[serde(rename = "publicKeyJwk")]
    pub public_key_jwk: Jwk,
}

impl VerificationMethod {
    pub fn new(controller: &str, key: &KeyInfo) -> Self {
        Self {
            id: key.kid.to_owned(),
            typ: VERIFICATION_METHOD_TYPE.to_string(),
            controller: controller.to_string(),
            public_key_jwk: Jwk::new(key.key_type, &key.public_key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct Service {
    pub id: String,

    #[serde(rename = "type")]
    pub typ: String,

    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: String,
}

/// `Document` is the resolved description of an identifier
///
/// Verification relationships (`authentication`, `assertionMethod`, `keyAgreement`)
/// are kept as references to entries of `verificationMethod`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct Document {
    pub id: String,

    #[serde(rename = "verificationMethod", default)]
    pub verification_method: Vec<VerificationMethod>,

    #[serde(default)]
    pub authentication: Vec<String>,

    #[serde(rename = "assertionMethod", default)]
    pub assertion_method: Vec<String>,

    #[serde(rename = "keyAgreement", default)]
    pub key_agreement: Vec<String>,

    #[serde(default)]
    pub service: Vec<Service>,
}

impl Document {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            verification_method: Vec::new(),
            authentication: Vec::new(),
            assertion_method: Vec::new(),
            key_agreement: Vec::new(),
            service: Vec::new(),
        }
    }

    pub fn add_authentication(&mut self, method: VerificationMethod) -> &mut Self {
        self.authentication.push(method.id.clone());
        self.assertion_method.push(method.id.clone());
        self.verification_method.push(method);
        self
    }

    pub fn add_key_agreement(&mut self, method: VerificationMethod) -> &mut Self {
        self.key_agreement.push(method.id.clone());
        self.verification_method.push(method);
        self
    }

    pub fn add_messaging_service(&mut self, endpoint: &str) -> &mut Self {
        self.service.push(Service {
            id: format!("{}#didcomm-{}", self.id, self.service.len() + 1),
            typ: SERVICE_DIDCOMM_MESSAGING.to_string(),
            service_endpoint: endpoint.to_string(),
        });
        self
    }

    pub fn find_method(&self, kid: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|vm| vm.id == kid)
    }

    pub fn authentication_methods(&self) -> Vec<&VerificationMethod> {
        self.lookup(&self.authentication)
    }

    pub fn key_agreement_methods(&self) -> Vec<&VerificationMethod> {
        self.lookup(&self.key_agreement)
    }

    /// `messaging_endpoint` returns the first `DIDCommMessaging` service endpoint
    pub fn messaging_endpoint(&self) -> Option<String> {
        self.service
            .iter()
            .find(|svc| svc.typ == SERVICE_DIDCOMM_MESSAGING)
            .map(|svc| svc.service_endpoint.to_owned())
    }

    fn lookup(&self, refs: &[String]) -> Vec<&VerificationMethod> {
        refs.iter()
            .filter_map(|kid| self.find_method(kid))
            .collect()
    }
}
