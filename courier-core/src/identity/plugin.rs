use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::Value;

use crate::agent::helpers::{output, params};
use crate::agent::{Capability, MethodSpec, Plugin, PluginError};
use crate::agent::{
    METHOD_DID_MANAGER_CREATE, METHOD_KEY_MANAGER_CREATE, METHOD_KEY_MANAGER_GET_KEYS,
    METHOD_KEY_MANAGER_SIGN, METHOD_RESOLVE_DID,
};

use super::keystore::LocalKeyStore;
use super::manager::IdentifierManager;
use super::resolver::parse_did;
use super::types::{KeyStore, KeyType, Resolver};

#[derive(Deserialize)]
#[serde(crate = "self::serde")]
struct ResolveParams {
    #[serde(rename = "didUrl")]
    did_url: String,
}

#[derive(Deserialize)]
#[serde(crate = "self::serde")]
struct CreateIdentifierParams {
    did: String,
    endpoint: Option<String>,
}

#[derive(Deserialize)]
#[serde(crate = "self::serde")]
struct CreateKeyParams {
    kid: String,

    #[serde(rename = "type")]
    key_type: KeyType,
}

#[derive(Deserialize)]
#[serde(crate = "self::serde")]
struct SignParams {
    kid: String,
    data: String,
}

#[derive(Serialize)]
#[serde(crate = "self::serde")]
struct SignOutput {
    signature: String,
}

/// `ResolverPlugin` serves `resolveDid`
pub struct ResolverPlugin {
    resolver: Arc<dyn Resolver>,
}

impl ResolverPlugin {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    async fn resolve_did(&self, args: Value) -> Result<Value, PluginError> {
        let param: ResolveParams = params(args)?;
        let doc = self.resolver.resolve(&param.did_url).await?;
        output(doc)
    }
}

impl Plugin for ResolverPlugin {
    fn name(&self) -> String {
        "resolver".to_string()
    }

    fn methods(self: Arc<Self>) -> Vec<MethodSpec> {
        let plugin = self.clone();
        vec![
            MethodSpec::new(METHOD_RESOLVE_DID, Capability::Resolver).handler(move |args, _| {
                let plugin = plugin.clone();
                async move { plugin.resolve_did(args).await }
            }),
        ]
    }
}

/// `KeyManagerPlugin` serves key management and identifier provisioning methods
/// backed by a [`LocalKeyStore`]
pub struct KeyManagerPlugin {
    keystore: Arc<LocalKeyStore>,
    manager: IdentifierManager,
}

impl KeyManagerPlugin {
    pub fn new(keystore: Arc<LocalKeyStore>, manager: IdentifierManager) -> Self {
        Self { keystore, manager }
    }

    async fn create_identifier(&self, args: Value) -> Result<Value, PluginError> {
        let param: CreateIdentifierParams = params(args)?;
        let did = parse_did(&param.did)?;
        let doc = self.manager.create(did, param.endpoint).await?;
        output(doc)
    }

    async fn create_key(&self, args: Value) -> Result<Value, PluginError> {
        let param: CreateKeyParams = params(args)?;
        let info = self.keystore.create(&param.kid, param.key_type).await?;
        output(info)
    }

    async fn get_keys(&self) -> Result<Value, PluginError> {
        output(self.keystore.list().await)
    }

    async fn sign(&self, args: Value) -> Result<Value, PluginError> {
        let param: SignParams = params(args)?;
        let data = URL_SAFE_NO_PAD
            .decode(param.data.as_bytes())
            .map_err(|err| PluginError::InvalidParams(err.to_string()))?;

        let signature = self.keystore.sign(&param.kid, &data).await?;
        output(SignOutput {
            signature: URL_SAFE_NO_PAD.encode(signature),
        })
    }
}

impl Plugin for KeyManagerPlugin {
    fn name(&self) -> String {
        "key-manager".to_string()
    }

    fn methods(self: Arc<Self>) -> Vec<MethodSpec> {
        let (create_identifier, create_key, get_keys, sign) =
            (self.clone(), self.clone(), self.clone(), self.clone());

        vec![
            MethodSpec::new(METHOD_DID_MANAGER_CREATE, Capability::IdentifierManager).handler(
                move |args, _| {
                    let plugin = create_identifier.clone();
                    async move { plugin.create_identifier(args).await }
                },
            ),
            MethodSpec::new(METHOD_KEY_MANAGER_CREATE, Capability::KeyManager).handler(
                move |args, _| {
                    let plugin = create_key.clone();
                    async move { plugin.create_key(args).await }
                },
            ),
            MethodSpec::new(METHOD_KEY_MANAGER_GET_KEYS, Capability::KeyManager).handler(
                move |_, _| {
                    let plugin = get_keys.clone();
                    async move { plugin.get_keys().await }
                },
            ),
            MethodSpec::new(METHOD_KEY_MANAGER_SIGN, Capability::KeyManager).handler(
                move |args, _| {
                    let plugin = sign.clone();
                    async move { plugin.sign(args).await }
                },
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::standard::serde_json::json;
    use rst_common::with_tokio::tokio;

    use crate::agent::{Agent, AgentError};
    use crate::didcomm::crypto::verify_ed25519;
    use crate::identity::document::Document;
    use crate::identity::resolver::MemoryResolver;
    use crate::identity::types::{KeyInfo, ResolutionError};

    fn build_agent() -> Agent {
        let keystore = Arc::new(LocalKeyStore::new());
        let resolver = Arc::new(MemoryResolver::new());
        let manager = IdentifierManager::new(keystore.clone(), resolver.clone());

        Agent::new(vec![
            Arc::new(ResolverPlugin::new(resolver)),
            Arc::new(KeyManagerPlugin::new(keystore, manager)),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_resolve_identifier() {
        let agent = build_agent();
        let created: Result<Document, AgentError> = agent
            .execute_as(
                METHOD_DID_MANAGER_CREATE,
                json!({ "did": "did:example:alice", "endpoint": "local://alice" }),
                None,
            )
            .await;
        assert!(!created.is_err());

        let resolved: Document = agent
            .execute_as(
                METHOD_RESOLVE_DID,
                json!({ "didUrl": "did:example:alice#key-1" }),
                None,
            )
            .await
            .unwrap();
        assert_eq!(resolved, created.unwrap());

        let keys: Vec<KeyInfo> = agent
            .execute_as(METHOD_KEY_MANAGER_GET_KEYS, Value::Null, None)
            .await
            .unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    async fn test_sign() {
        let agent = build_agent();
        let info: KeyInfo = agent
            .execute_as(
                METHOD_KEY_MANAGER_CREATE,
                json!({ "kid": "did:example:alice#key-2", "type": "Ed25519" }),
                None,
            )
            .await
            .unwrap();

        let signed = agent
            .execute(
                METHOD_KEY_MANAGER_SIGN,
                json!({ "kid": info.kid, "data": URL_SAFE_NO_PAD.encode(b"hello") }),
                None,
            )
            .await
            .unwrap();

        let signature = URL_SAFE_NO_PAD
            .decode(signed["signature"].as_str().unwrap())
            .unwrap();
        let public: [u8; 32] = info.public_key.try_into().unwrap();
        assert!(verify_ed25519(&public, b"hello", &signature).is_ok())
    }

    #[tokio::test]
    async fn test_resolve_unknown() {
        let agent = build_agent();
        let output = agent
            .execute(METHOD_RESOLVE_DID, json!({ "didUrl": "did:example:bob" }), None)
            .await;

        assert!(output.is_err());
        let err = output.unwrap_err();
        assert!(matches!(
            err.cause(),
            Some(PluginError::Resolution(ResolutionError::NotFound(_)))
        ))
    }

    #[tokio::test]
    async fn test_invalid_identifier() {
        let agent = build_agent();
        let output = agent
            .execute(METHOD_DID_MANAGER_CREATE, json!({ "did": "alice" }), None)
            .await;

        assert!(matches!(
            output.unwrap_err().cause(),
            Some(PluginError::Resolution(ResolutionError::InvalidIdentifier(_)))
        ))
    }
}
