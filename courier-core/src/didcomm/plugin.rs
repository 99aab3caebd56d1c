use std::sync::Arc;

use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{json, Value};

use crate::agent::helpers::{output, params};
use crate::agent::{AgentEvent, Capability, Context, MethodSpec, Plugin, PluginError};
use crate::agent::{
    EVENT_DIDCOMM_MESSAGE_SENT, METHOD_GET_DIDCOMM_MESSAGE_MEDIA_TYPE,
    METHOD_PACK_DIDCOMM_MESSAGE, METHOD_SEND_DIDCOMM_MESSAGE, METHOD_UNPACK_DIDCOMM_MESSAGE,
};
use crate::message::types::TypedMessage;

use super::engine::DIDComm;
use super::types::Packing;

#[derive(Deserialize)]
#[serde(crate = "self::serde")]
struct PackParams {
    message: TypedMessage,
    packing: String,

    #[serde(rename = "keyRef")]
    #[serde(default)]
    key_ref: Option<String>,

    /// Optional encryption applied over the packed envelope
    #[serde(default)]
    envelope: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "self::serde")]
struct PackOutput {
    message: String,
}

#[derive(Deserialize)]
#[serde(crate = "self::serde")]
struct PackedParams {
    message: String,
}

#[derive(Deserialize)]
#[serde(crate = "self::serde")]
struct SendParams {
    #[serde(rename = "messageId")]
    message_id: String,

    #[serde(rename = "packedMessage")]
    packed_message: String,

    #[serde(rename = "recipientDidUrl")]
    recipient_did_url: String,
}

#[derive(Serialize)]
#[serde(crate = "self::serde")]
struct MediaTypeOutput {
    #[serde(rename = "mediaType")]
    media_type: String,
}

/// `DIDCommPlugin` exposes the [`DIDComm`] engine as messaging methods
pub struct DIDCommPlugin {
    didcomm: Arc<DIDComm>,
}

impl DIDCommPlugin {
    pub fn new(didcomm: Arc<DIDComm>) -> Self {
        Self { didcomm }
    }

    async fn pack(&self, args: Value) -> Result<Value, PluginError> {
        let param: PackParams = params(args)?;
        let packing = param.packing.parse::<Packing>()?;
        let key_ref = param.key_ref.as_deref();

        let packed = match param.envelope {
            Some(envelope) => {
                let outer = envelope.parse::<Packing>()?;
                self.didcomm
                    .pack_nested(&param.message, packing, outer, key_ref)
                    .await?
            }
            None => self.didcomm.pack(&param.message, packing, key_ref).await?,
        };

        output(PackOutput { message: packed })
    }

    async fn unpack(&self, args: Value) -> Result<Value, PluginError> {
        let param: PackedParams = params(args)?;
        let unpacked = self.didcomm.unpack(&param.message).await?;
        output(unpacked)
    }

    async fn send(&self, args: Value, ctx: Context) -> Result<Value, PluginError> {
        let param: SendParams = params(args)?;
        let ack = self
            .didcomm
            .send(
                &param.packed_message,
                &param.recipient_did_url,
                Some(&param.message_id),
            )
            .await?;

        ctx.agent().emit(AgentEvent::new(
            EVENT_DIDCOMM_MESSAGE_SENT,
            json!({
                "messageId": param.message_id,
                "recipientDidUrl": param.recipient_did_url,
                "transport": ack.transport,
            }),
        ));

        output(ack)
    }

    async fn media_type(&self, args: Value) -> Result<Value, PluginError> {
        let param: PackedParams = params(args)?;
        let media_type = self.didcomm.media_type(&param.message)?;
        output(MediaTypeOutput { media_type })
    }
}

impl Plugin for DIDCommPlugin {
    fn name(&self) -> String {
        "didcomm".to_string()
    }

    fn methods(self: Arc<Self>) -> Vec<MethodSpec> {
        let (pack, unpack, send, media_type) =
            (self.clone(), self.clone(), self.clone(), self.clone());

        vec![
            MethodSpec::new(METHOD_PACK_DIDCOMM_MESSAGE, Capability::Messaging).handler(
                move |args, _| {
                    let plugin = pack.clone();
                    async move { plugin.pack(args).await }
                },
            ),
            MethodSpec::new(METHOD_UNPACK_DIDCOMM_MESSAGE, Capability::Messaging).handler(
                move |args, _| {
                    let plugin = unpack.clone();
                    async move { plugin.unpack(args).await }
                },
            ),
            MethodSpec::new(METHOD_SEND_DIDCOMM_MESSAGE, Capability::Messaging).handler(
                move |args, ctx| {
                    let plugin = send.clone();
                    async move { plugin.send(args, ctx).await }
                },
            ),
            MethodSpec::new(METHOD_GET_DIDCOMM_MESSAGE_MEDIA_TYPE, Capability::Messaging)
                .handler(move |args, _| {
                    let plugin = media_type.clone();
                    async move { plugin.media_type(args).await }
                }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::with_tokio::tokio;
    use rst_common::with_tokio::tokio::sync::mpsc::UnboundedReceiver;

    use crate::agent::Agent;
    use crate::didcomm::transport::LoopbackTransport;
    use crate::didcomm::types::{
        DIDCommError, TransportAck, UnpackedMessage, MEDIA_TYPE_ENCRYPTED,
    };
    use crate::identity::{IdentifierManager, LocalKeyStore, MemoryResolver};

    async fn build_agent() -> (Agent, UnboundedReceiver<String>) {
        let resolver = Arc::new(MemoryResolver::new());
        let keystore = Arc::new(LocalKeyStore::new());
        let manager = IdentifierManager::new(keystore.clone(), resolver.clone());
        let _ = manager
            .create("did:example:alice", Some("local://alice".to_string()))
            .await
            .unwrap();
        let _ = manager
            .create("did:example:bob", Some("local://bob".to_string()))
            .await
            .unwrap();

        let transport = Arc::new(LoopbackTransport::new());
        let inbox = transport.register("local://bob").await;

        let mut didcomm = DIDComm::new(resolver, keystore);
        didcomm.add_transport(transport);

        let agent = Agent::new(vec![Arc::new(DIDCommPlugin::new(Arc::new(didcomm)))]).unwrap();
        (agent, inbox)
    }

    fn message() -> Value {
        json!({
            "type": "https://example.com/hello",
            "id": "m1",
            "from": "did:example:alice",
            "to": "did:example:bob",
            "body": { "hello": "bob" },
        })
    }

    mod expect_success {
        use super::*;

        #[tokio::test]
        async fn test_pack_unpack_send() {
            let (agent, mut inbox) = build_agent().await;
            let mut events = agent.subscribe();

            let packed = agent
                .execute(
                    METHOD_PACK_DIDCOMM_MESSAGE,
                    json!({ "message": message(), "packing": "authcrypt" }),
                    None,
                )
                .await
                .unwrap();
            let packed = packed["message"].as_str().unwrap().to_string();

            let media_type = agent
                .execute(
                    METHOD_GET_DIDCOMM_MESSAGE_MEDIA_TYPE,
                    json!({ "message": packed }),
                    None,
                )
                .await
                .unwrap();
            assert_eq!(media_type["mediaType"], json!(MEDIA_TYPE_ENCRYPTED));

            let unpacked: UnpackedMessage = agent
                .execute_as(
                    METHOD_UNPACK_DIDCOMM_MESSAGE,
                    json!({ "message": packed }),
                    None,
                )
                .await
                .unwrap();
            assert_eq!(unpacked.message.body, json!({ "hello": "bob" }));

            let ack: TransportAck = agent
                .execute_as(
                    METHOD_SEND_DIDCOMM_MESSAGE,
                    json!({
                        "messageId": "m1",
                        "packedMessage": packed,
                        "recipientDidUrl": "did:example:bob",
                    }),
                    None,
                )
                .await
                .unwrap();
            assert_eq!(ack.message_id, Some("m1".to_string()));
            assert_eq!(inbox.recv().await, Some(packed));

            let mut kinds = Vec::new();
            while let Ok(event) = events.try_recv() {
                kinds.push(event.kind);
            }
            assert!(kinds.contains(&EVENT_DIDCOMM_MESSAGE_SENT.to_string()));
        }

        #[tokio::test]
        async fn test_pack_with_envelope() {
            let (agent, _) = build_agent().await;
            let packed = agent
                .execute(
                    METHOD_PACK_DIDCOMM_MESSAGE,
                    json!({ "message": message(), "packing": "jws", "envelope": "anoncrypt" }),
                    None,
                )
                .await
                .unwrap();

            let unpacked: UnpackedMessage = agent
                .execute_as(
                    METHOD_UNPACK_DIDCOMM_MESSAGE,
                    json!({ "message": packed["message"] }),
                    None,
                )
                .await
                .unwrap();
            assert_eq!(unpacked.metadata.packing, Packing::Anoncrypt);
            assert!(unpacked.metadata.authenticated);
        }
    }

    mod expect_error {
        use super::*;

        #[tokio::test]
        async fn test_unsupported_packing() {
            let (agent, _) = build_agent().await;
            let output = agent
                .execute(
                    METHOD_PACK_DIDCOMM_MESSAGE,
                    json!({ "message": message(), "packing": "rot13" }),
                    None,
                )
                .await;

            assert!(matches!(
                output.unwrap_err().cause(),
                Some(PluginError::DIDComm(DIDCommError::UnsupportedPacking(_)))
            ))
        }

        #[tokio::test]
        async fn test_send_unknown_endpoint() {
            let (agent, _) = build_agent().await;
            let output = agent
                .execute(
                    METHOD_SEND_DIDCOMM_MESSAGE,
                    json!({
                        "messageId": "m1",
                        "packedMessage": "{}",
                        "recipientDidUrl": "did:example:alice",
                    }),
                    None,
                )
                .await;

            assert!(matches!(
                output.unwrap_err().cause(),
                Some(PluginError::DIDComm(DIDCommError::Transport(_)))
            ))
        }
    }
}
