use std::sync::Arc;

use rst_common::standard::serde_json::{json, Value};
use rst_common::with_tokio::tokio::sync::mpsc::UnboundedReceiver;

use prople_did_core::did::DID;
use prople_did_core::doc::types::{Doc, ToDoc};
use prople_did_core::keys::{IdentityPrivateKeyPairs, IdentityPrivateKeyPairsBuilder};
use prople_did_core::types::{CONTEXT_VC, CONTEXT_VC_V2};
use prople_did_core::verifiable::objects::{VC, VP};

use crate::agent::{Agent, AgentError, Plugin, METHOD_HANDLE_MESSAGE};
use crate::didcomm::{DIDComm, DIDCommMessageHandler, DIDCommPlugin, LoopbackTransport};
use crate::identity::{
    IdentifierManager, KeyManagerPlugin, LocalKeyStore, MemoryResolver, ResolverPlugin,
};
use crate::message::{ClassifiedMessage, HandlerChain, MessageHandler, MessageHandlerPlugin};
use crate::protocols::{
    CredentialHandler, ExchangeStore, SelectiveDisclosureHandler, SelectiveDisclosurePlugin,
    TrustPingHandler, TrustPingPlugin,
};
use crate::store::{DataStorePlugin, MemoryDataStore};
use crate::verifiable::proof::builder::Builder;
use crate::verifiable::{MemoryDocResolver, ProofCredentialVerifier};

pub(crate) struct Identity {
    pub did: String,
    pub doc: Doc,
    pub private_keys: IdentityPrivateKeyPairs,
}

pub(crate) fn generate_identity() -> Identity {
    let did = DID::new();
    let mut identity = did.identity().unwrap();
    let value = identity.value();

    let doc = identity
        .build_assertion_method()
        .build_auth_method()
        .to_doc();

    let private_keys = identity
        .build_private_keys("password".to_string())
        .unwrap();

    Identity {
        did: value,
        doc,
        private_keys,
    }
}

pub(crate) fn generate_credential(id: &str, issuer: &str, claims: Value) -> VC {
    let mut vc = VC::new(id.to_string(), issuer.to_string());
    vc.add_context(CONTEXT_VC.to_string())
        .add_context(CONTEXT_VC_V2.to_string())
        .add_type("VerifiableCredential".to_string())
        .set_credential(claims);

    vc
}

pub(crate) fn signed_credential(issuer: &Identity, id: &str, claims: Value) -> VC {
    let mut vc = generate_credential(id, &issuer.did, claims);
    let proof = Builder::build_proof(
        vc.clone(),
        "password".to_string(),
        issuer.private_keys.clone(),
    )
    .unwrap()
    .unwrap();

    vc.proof(proof);
    vc
}

pub(crate) fn generate_presentation(holder: &Identity, credentials: Vec<VC>) -> VP {
    let mut vp = VP::new();
    vp.add_context(CONTEXT_VC_V2.to_string())
        .add_type("VerifiablePresentation".to_string())
        .set_holder(holder.did.clone());

    for vc in credentials.into_iter() {
        vp.add_credential(vc);
    }

    let proof = Builder::build_proof(
        vp.clone(),
        "password".to_string(),
        holder.private_keys.clone(),
    )
    .unwrap()
    .unwrap();

    vp.add_proof(proof);
    vp
}

/// `Party` is a fully assembled agent reachable through the loopback transport
pub(crate) struct Party {
    pub did: String,
    pub agent: Agent,
    pub store: Arc<MemoryDataStore>,
    pub exchanges: Arc<ExchangeStore>,
    pub inbox: UnboundedReceiver<String>,
}

impl Party {
    /// `receive` handles the next delivered message
    pub async fn receive(&mut self) -> Result<ClassifiedMessage, AgentError> {
        let raw = self.inbox.recv().await.unwrap();
        self.agent
            .execute_as(METHOD_HANDLE_MESSAGE, json!({ "raw": raw }), None)
            .await
    }
}

/// `Network` shares resolution and transport between parties
pub(crate) struct Network {
    resolver: Arc<MemoryResolver>,
    transport: Arc<LoopbackTransport>,
    docs: Arc<MemoryDocResolver>,
}

impl Network {
    pub fn new() -> Self {
        Self {
            resolver: Arc::new(MemoryResolver::new()),
            transport: Arc::new(LoopbackTransport::new()),
            docs: Arc::new(MemoryDocResolver::new()),
        }
    }

    pub async fn party(&self, name: &str) -> Party {
        let did = format!("did:example:{}", name);
        let endpoint = format!("local://{}", name);

        let keys = Arc::new(LocalKeyStore::new());
        let manager = IdentifierManager::new(keys.clone(), self.resolver.clone());
        let _ = manager.create(&did, Some(endpoint.clone())).await.unwrap();
        let inbox = self.transport.register(&endpoint).await;

        let mut didcomm = DIDComm::new(self.resolver.clone(), keys.clone());
        didcomm.add_transport(self.transport.clone());
        let didcomm = Arc::new(didcomm);

        let store = Arc::new(MemoryDataStore::new());
        let exchanges = Arc::new(ExchangeStore::new());
        let verifier = Arc::new(ProofCredentialVerifier::new(self.docs.clone()));

        let chain = HandlerChain::new(vec![
            Arc::new(DIDCommMessageHandler::new(didcomm.clone())) as Arc<dyn MessageHandler>,
            Arc::new(TrustPingHandler::new(exchanges.clone())) as Arc<dyn MessageHandler>,
            Arc::new(SelectiveDisclosureHandler::new(exchanges.clone()))
                as Arc<dyn MessageHandler>,
            Arc::new(CredentialHandler::new(verifier)) as Arc<dyn MessageHandler>,
        ]);

        let plugins: Vec<Arc<dyn Plugin>> = vec![
            Arc::new(ResolverPlugin::new(self.resolver.clone())),
            Arc::new(KeyManagerPlugin::new(keys, manager)),
            Arc::new(DIDCommPlugin::new(didcomm)),
            Arc::new(DataStorePlugin::new(store.clone())),
            Arc::new(MessageHandlerPlugin::new(chain)),
            Arc::new(TrustPingPlugin::new(exchanges.clone())),
            Arc::new(SelectiveDisclosurePlugin::new(exchanges.clone())),
        ];

        Party {
            did,
            agent: Agent::new(plugins).unwrap(),
            store,
            exchanges,
            inbox,
        }
    }
}
