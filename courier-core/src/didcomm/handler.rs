use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json;
use rst_common::with_logging::log::debug;

use crate::agent::Context;
use crate::message::types::{Message, MessageError, MessageHandler, Outcome};

use super::engine::{detect_packing, DIDComm};

pub const META_DIDCOMM: &str = "DIDComm";
pub const META_DIDCOMM_SENDER: &str = "DIDCommSender";

/// `DIDCommMessageHandler` unwraps DIDComm envelopes and re-offers the plaintext
/// message to the rest of the chain
///
/// It never classifies anything by itself. Any input that doesn't look like a DIDComm
/// message continues untouched
pub struct DIDCommMessageHandler {
    didcomm: Arc<DIDComm>,
}

impl DIDCommMessageHandler {
    pub fn new(didcomm: Arc<DIDComm>) -> Self {
        Self { didcomm }
    }
}

#[async_trait]
impl MessageHandler for DIDCommMessageHandler {
    fn name(&self) -> String {
        "didcomm".to_string()
    }

    async fn handle(&self, message: Message, _: &Context) -> Result<Outcome, MessageError> {
        if message.typed().is_some() {
            return Ok(Outcome::Continue(message));
        }

        let packing = match detect_packing(message.raw()) {
            Ok(packing) => packing,
            Err(err) => {
                debug!("not a didcomm message: {}", err);
                return Ok(Outcome::Continue(message));
            }
        };

        let unpacked = self.didcomm.unpack(message.raw()).await?;
        let raw = serde_json::to_string(&unpacked.message)
            .map_err(|err| MessageError::JSONError(err.to_string()))?;

        let sender = unpacked
            .metadata
            .signer
            .clone()
            .or(unpacked.metadata.sender_kid.clone());

        let mut next = message
            .unwrap_into(raw, unpacked.message)
            .add_metadata(META_DIDCOMM, Some(packing.to_string()));

        if let Some(kid) = sender {
            next = next.add_metadata(META_DIDCOMM_SENDER, Some(kid));
        }

        Ok(Outcome::Continue(next))
    }
}
