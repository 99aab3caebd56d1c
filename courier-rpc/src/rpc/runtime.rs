use std::sync::Arc;

use rst_common::standard::chrono::Utc;
use rst_common::standard::serde_json::{self, json};
use rst_common::with_logging::log::{debug, info, warn};
use rst_common::with_tokio::tokio;

use prople_did_core::doc::types::Doc;

use prople_courier_core::agent::{Agent, Plugin, METHOD_HANDLE_MESSAGE};
use prople_courier_core::didcomm::{
    DIDComm, DIDCommMessageHandler, DIDCommPlugin, LoopbackTransport,
};
use prople_courier_core::identity::{
    IdentifierManager, KeyManagerPlugin, LocalKeyStore, MemoryResolver, ResolverPlugin,
};
use prople_courier_core::message::{HandlerChain, MessageHandler, MessageHandlerPlugin};
use prople_courier_core::protocols::{
    CredentialHandler, ExchangeStore, SelectiveDisclosureHandler, SelectiveDisclosurePlugin,
    TrustPingHandler, TrustPingPlugin,
};
use prople_courier_core::store::{DataStorePlugin, MemoryDataStore};
use prople_courier_core::verifiable::{MemoryDocResolver, ProofCredentialVerifier};

use crate::common::types::CommonError;
use crate::config::Agent as AgentConfig;

/// `load_issuers` reads the trusted issuer documents into the credential doc resolver
async fn load_issuers(config: &AgentConfig) -> Result<MemoryDocResolver, CommonError> {
    let docs = MemoryDocResolver::new();
    for issuer in config.get_issuers().iter() {
        let content = tokio::fs::read_to_string(&issuer.doc)
            .await
            .map_err(|err| CommonError::ConfigError(format!("{}: {}", issuer.doc, err)))?;

        let doc: Doc = serde_json::from_str(&content)
            .map_err(|err| CommonError::JSONError(format!("{}: {}", issuer.doc, err)))?;

        docs.insert(&issuer.did, doc).await;
        debug!("trusting issuer {}", issuer.did);
    }

    Ok(docs)
}

/// `Runtime` assembles a local agent from its configuration
///
/// Messages delivered to the agent endpoint are handled in the background and
/// saved through the data store
pub struct Runtime {
    agent: Agent,
    exchanges: Arc<ExchangeStore>,
}

impl Runtime {
    pub async fn build(config: &AgentConfig) -> Result<Self, CommonError> {
        let (did, endpoint) = config.get_identity();

        let resolver = Arc::new(MemoryResolver::new());
        let keys = Arc::new(LocalKeyStore::new());
        let manager = IdentifierManager::new(keys.clone(), resolver.clone());
        let _ = manager
            .create(&did, Some(endpoint.clone()))
            .await
            .map_err(|err| CommonError::AgentError(err.to_string()))?;

        let transport = Arc::new(LoopbackTransport::new());
        let mut inbox = transport.register(&endpoint).await;

        let mut didcomm = DIDComm::new(resolver.clone(), keys.clone());
        didcomm.add_transport(transport);
        let didcomm = Arc::new(didcomm);

        let exchanges = match config.get_exchange_ttl() {
            Some(ttl) => Arc::new(ExchangeStore::with_ttl(ttl)),
            None => Arc::new(ExchangeStore::new()),
        };

        let docs = load_issuers(config).await?;
        let verifier = Arc::new(ProofCredentialVerifier::new(Arc::new(docs)));

        let chain = HandlerChain::new(vec![
            Arc::new(DIDCommMessageHandler::new(didcomm.clone())) as Arc<dyn MessageHandler>,
            Arc::new(TrustPingHandler::new(exchanges.clone())) as Arc<dyn MessageHandler>,
            Arc::new(SelectiveDisclosureHandler::new(exchanges.clone()))
                as Arc<dyn MessageHandler>,
            Arc::new(CredentialHandler::new(verifier)) as Arc<dyn MessageHandler>,
        ]);

        let plugins: Vec<Arc<dyn Plugin>> = vec![
            Arc::new(ResolverPlugin::new(resolver)),
            Arc::new(KeyManagerPlugin::new(keys, manager)),
            Arc::new(DIDCommPlugin::new(didcomm)),
            Arc::new(DataStorePlugin::new(Arc::new(MemoryDataStore::new()))),
            Arc::new(MessageHandlerPlugin::new(chain)),
            Arc::new(TrustPingPlugin::new(exchanges.clone())),
            Arc::new(SelectiveDisclosurePlugin::new(exchanges.clone())),
        ];

        let agent =
            Agent::new(plugins).map_err(|err| CommonError::AgentError(err.to_string()))?;

        let inbound = agent.clone();
        tokio::spawn(async move {
            while let Some(raw) = inbox.recv().await {
                let handled = inbound
                    .execute(METHOD_HANDLE_MESSAGE, json!({ "raw": raw, "save": true }), None)
                    .await;

                if let Err(err) = handled {
                    warn!("inbound message rejected: {}", err);
                }
            }
        });

        if let Some(ttl) = config.get_exchange_ttl().filter(|ttl| !ttl.is_zero()) {
            let expiring = exchanges.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(ttl);
                loop {
                    ticker.tick().await;
                    let dropped = expiring.gc(Utc::now()).await;
                    if dropped > 0 {
                        debug!("dropped {} expired exchanges", dropped);
                    }
                }
            });
        }

        info!("agent {} listening on {}", did, endpoint);
        Ok(Self { agent, exchanges })
    }

    pub fn agent(&self) -> Agent {
        self.agent.clone()
    }

    pub fn exchanges(&self) -> Arc<ExchangeStore> {
        self.exchanges.clone()
    }
}
