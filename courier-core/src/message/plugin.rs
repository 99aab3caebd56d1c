use std::sync::Arc;

use rst_common::standard::serde::{self, Deserialize};
use rst_common::standard::serde_json::{json, Value};
use rst_common::with_logging::log::{debug, info};

use crate::agent::helpers::{output, params};
use crate::agent::{AgentEvent, Capability, Context, MethodSpec, Plugin, PluginError};
use crate::agent::{EVENT_MESSAGE_HANDLED, METHOD_DATA_STORE_SAVE, METHOD_HANDLE_MESSAGE};
use crate::store::types::{Record, RecordKind};

use super::chain::HandlerChain;
use super::types::{ClassifiedMessage, Message, MetaData};

#[derive(Deserialize)]
#[serde(crate = "self::serde")]
struct HandleParams {
    raw: String,

    #[serde(default)]
    metadata: Vec<MetaData>,

    #[serde(default)]
    save: bool,
}

/// `MessageHandlerPlugin` exposes a [`HandlerChain`] through `handleMessage`
///
/// A classified message flagged with `save` is persisted through `dataStoreSave`,
/// but only when the agent serves it
pub struct MessageHandlerPlugin {
    chain: HandlerChain,
}

impl MessageHandlerPlugin {
    pub fn new(chain: HandlerChain) -> Self {
        Self { chain }
    }

    async fn handle_message(&self, args: Value, ctx: Context) -> Result<Value, PluginError> {
        let param: HandleParams = params(args)?;

        let mut message = Message::new(&param.raw).with_save(param.save);
        for meta in param.metadata.into_iter() {
            message = message.add_metadata(&meta.kind, meta.value);
        }

        let classified = self.chain.handle(message, &ctx).await?;
        if classified.save() {
            self.persist(&classified, &ctx).await?;
        }

        info!(
            "handled message {} of type {}",
            classified.message().id,
            classified.typ()
        );

        ctx.agent().emit(AgentEvent::new(
            EVENT_MESSAGE_HANDLED,
            json!({
                "id": classified.message().id,
                "type": classified.typ(),
            }),
        ));

        output(classified)
    }

    async fn persist(
        &self,
        classified: &ClassifiedMessage,
        ctx: &Context,
    ) -> Result<(), PluginError> {
        if !ctx.agent().has_method(METHOD_DATA_STORE_SAVE) {
            debug!("no data store available, skip saving {}", classified.message().id);
            return Ok(());
        }

        let data = output(classified)?;
        let mut record = Record::new(RecordKind::Message, data);
        record.set_tag(classified.typ());
        if let Some(from) = &classified.message().from {
            record.set_subject(from);
        }

        let args = output(record)?;
        let _ = ctx
            .agent()
            .execute(METHOD_DATA_STORE_SAVE, args, None)
            .await?;

        Ok(())
    }
}

impl Plugin for MessageHandlerPlugin {
    fn name(&self) -> String {
        "message-handler".to_string()
    }

    fn methods(self: Arc<Self>) -> Vec<MethodSpec> {
        let plugin = self.clone();
        vec![
            MethodSpec::new(METHOD_HANDLE_MESSAGE, Capability::MessageHandler).handler(
                move |args, ctx| {
                    let plugin = plugin.clone();
                    async move { plugin.handle_message(args, ctx).await }
                },
            ),
        ]
    }
}
