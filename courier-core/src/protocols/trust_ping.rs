use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, json, Value};
use rst_common::with_logging::log::{debug, warn};

use crate::agent::helpers::{output, params};
use crate::agent::{Capability, Context, MethodSpec, Plugin, PluginError};
use crate::agent::METHOD_SEND_TRUST_PING;
use crate::didcomm::types::Packing;
use crate::message::types::{Message, MessageError, MessageHandler, Outcome, TypedMessage};

use super::exchange::ExchangeStore;
use super::outbound::dispatch;
use super::types::{
    META_TRUST_PING_RESPONSE_FAILED, META_TRUST_PING_RESPONSE_RECEIVED,
    META_TRUST_PING_RESPONSE_REJECTED, META_TRUST_PING_RESPONSE_SENT, PROTOCOL_TRUST_PING,
    TRUST_PING_RESPONSE_TYPE, TRUST_PING_TYPE,
};

/// `create_ping` builds a ping asking the recipient to answer
pub fn create_ping(from: &str, to: &str) -> TypedMessage {
    let mut ping = TypedMessage::new(TRUST_PING_TYPE, json!({ "responseRequested": true }));
    ping.set_from(from).set_to(to);
    ping
}

fn response_requested(ping: &TypedMessage) -> bool {
    ping.body
        .get("responseRequested")
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

/// `TrustPingHandler` answers pings and correlates ping responses
///
/// Failing to answer a ping never fails the handling, the failure is recorded
/// as metadata of the classified ping
pub struct TrustPingHandler {
    exchanges: Arc<ExchangeStore>,
}

impl TrustPingHandler {
    pub fn new(exchanges: Arc<ExchangeStore>) -> Self {
        Self { exchanges }
    }

    async fn respond(&self, ping: &TypedMessage, ctx: &Context) -> Result<Value, MessageError> {
        if ping.from.is_none() || ping.to.is_none() {
            return Err(MessageError::InvalidMessage(
                "ping without sender or recipient".to_string(),
            ));
        }

        let response = ping.reply(TRUST_PING_RESPONSE_TYPE, json!({}));
        let ack = dispatch(ctx, &response, Packing::None).await?;
        Ok(ack)
    }
}

#[async_trait]
impl MessageHandler for TrustPingHandler {
    fn name(&self) -> String {
        "trust-ping".to_string()
    }

    async fn handle(&self, message: Message, ctx: &Context) -> Result<Outcome, MessageError> {
        let typed = match message.parse_typed() {
            Some(typed) => typed,
            None => return Ok(Outcome::Continue(message)),
        };

        match typed.typ.as_str() {
            TRUST_PING_TYPE => {
                let mut classified = message.classify(typed.clone());
                if !response_requested(&typed) {
                    return Ok(Outcome::Handled(classified));
                }

                classified = match self.respond(&typed, ctx).await {
                    Ok(ack) => {
                        classified.add_metadata(META_TRUST_PING_RESPONSE_SENT, Some(ack.to_string()))
                    }
                    Err(err) => {
                        warn!("unable to answer ping {}: {}", typed.id, err);
                        classified
                            .add_metadata(META_TRUST_PING_RESPONSE_FAILED, Some(err.to_string()))
                    }
                };

                Ok(Outcome::Handled(classified))
            }
            TRUST_PING_RESPONSE_TYPE => {
                let thid = typed.thid.clone().unwrap_or_default();
                let correlated = self
                    .exchanges
                    .correlate(&thid, typed.from.as_deref(), None)
                    .await;

                let classified = message.classify(typed);
                let classified = match correlated {
                    Ok(_) => classified.add_metadata(META_TRUST_PING_RESPONSE_RECEIVED, Some(thid)),
                    Err(err) => {
                        debug!("ping response not correlated: {}", err);
                        classified
                            .add_metadata(META_TRUST_PING_RESPONSE_REJECTED, Some(err.to_string()))
                    }
                };

                Ok(Outcome::Handled(classified))
            }
            _ => Ok(Outcome::Continue(message)),
        }
    }
}

fn default_packing() -> Packing {
    Packing::None
}

#[derive(Deserialize)]
#[serde(crate = "self::serde")]
struct SendPingParams {
    from: String,
    to: String,

    #[serde(default = "default_packing")]
    packing: Packing,
}

#[derive(Serialize)]
#[serde(crate = "self::serde")]
struct SendPingOutput {
    id: String,
    ack: Value,
}

/// `TrustPingPlugin` serves `sendTrustPing`
///
/// Each sent ping opens an exchange keyed by the ping id, closed once its
/// response is handled
pub struct TrustPingPlugin {
    exchanges: Arc<ExchangeStore>,
}

impl TrustPingPlugin {
    pub fn new(exchanges: Arc<ExchangeStore>) -> Self {
        Self { exchanges }
    }

    async fn send_ping(&self, args: Value, ctx: Context) -> Result<Value, PluginError> {
        let param: SendPingParams = params(args)?;
        let ping = create_ping(&param.from, &param.to);

        let request =
            serde_json::to_value(&ping).map_err(|err| PluginError::JSONError(err.to_string()))?;
        let _ = self
            .exchanges
            .open(&ping.id, PROTOCOL_TRUST_PING, Some(&param.to), request)
            .await?;

        let ack = match dispatch(&ctx, &ping, param.packing).await {
            Ok(ack) => ack,
            Err(err) => {
                let _ = self.exchanges.close(&ping.id).await;
                return Err(PluginError::from(err));
            }
        };

        output(SendPingOutput { id: ping.id, ack })
    }
}

impl Plugin for TrustPingPlugin {
    fn name(&self) -> String {
        "trust-ping".to_string()
    }

    fn methods(self: Arc<Self>) -> Vec<MethodSpec> {
        let plugin = self.clone();

        vec![
            MethodSpec::new(METHOD_SEND_TRUST_PING, Capability::Messaging).handler(
                move |args, ctx| {
                    let plugin = plugin.clone();
                    async move { plugin.send_ping(args, ctx).await }
                },
            ),
        ]
    }
}
