use std::collections::HashMap;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::debug;
use rst_common::with_tokio::tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use rst_common::with_tokio::tokio::sync::RwLock;

use super::types::{Transport, TransportAck, TransportError};

pub const LOOPBACK_SCHEME: &str = "local://";

/// `LoopbackTransport` delivers packed messages to in-process inboxes
///
/// An inbox is addressed by a `local://<name>` service endpoint
#[derive(Default)]
pub struct LoopbackTransport {
    inboxes: RwLock<HashMap<String, UnboundedSender<String>>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// `register` opens the inbox of an endpoint, replacing any previous one
    pub async fn register(&self, endpoint: &str) -> UnboundedReceiver<String> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inboxes = self.inboxes.write().await;
        inboxes.insert(endpoint.to_string(), sender);
        receiver
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    fn id(&self) -> String {
        "loopback".to_string()
    }

    fn is_match(&self, endpoint: &str) -> bool {
        endpoint.starts_with(LOOPBACK_SCHEME)
    }

    async fn send(&self, packed: &str, endpoint: &str) -> Result<TransportAck, TransportError> {
        let inboxes = self.inboxes.read().await;
        let inbox = inboxes
            .get(endpoint)
            .ok_or(TransportError::EndpointUnavailable(endpoint.to_string()))?;

        inbox
            .send(packed.to_string())
            .map_err(|err| TransportError::SendFailed(err.to_string()))?;

        debug!("delivered {} bytes to {}", packed.len(), endpoint);

        Ok(TransportAck {
            transport: self.id(),
            endpoint: endpoint.to_string(),
            message_id: None,
        })
    }
}
