use rst_common::standard::serde::{self, Deserialize};
use rst_common::standard::serde_json::{json, Value};

use crate::agent::{AgentError, Context};
use crate::agent::{METHOD_PACK_DIDCOMM_MESSAGE, METHOD_SEND_DIDCOMM_MESSAGE};
use crate::didcomm::types::Packing;
use crate::message::types::TypedMessage;

#[derive(Deserialize)]
#[serde(crate = "self::serde")]
struct Packed {
    message: String,
}

/// `dispatch` packs an outbound message and sends it to its `to` through the agent
///
/// It returns the transport acknowledgement as given by `sendDIDCommMessage`
pub(crate) async fn dispatch(
    ctx: &Context,
    message: &TypedMessage,
    packing: Packing,
) -> Result<Value, AgentError> {
    let recipient = message.to.clone().unwrap_or_default();

    let packed: Packed = ctx
        .agent()
        .execute_as(
            METHOD_PACK_DIDCOMM_MESSAGE,
            json!({ "message": message, "packing": packing }),
            None,
        )
        .await?;

    ctx.agent()
        .execute(
            METHOD_SEND_DIDCOMM_MESSAGE,
            json!({
                "messageId": message.id,
                "packedMessage": packed.message,
                "recipientDidUrl": recipient,
            }),
            None,
        )
        .await
}
