use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::{self, json, Value};
use rst_common::with_logging::log::{info, warn};

use prople_did_core::verifiable::objects::{VC, VP};

use crate::agent::{AgentError, Context, METHOD_DATA_STORE_SAVE};
use crate::message::types::{
    ClassifiedMessage, Message, MessageError, MessageHandler, Outcome, TypedMessage,
};
use crate::store::types::{Record, RecordKind};
use crate::verifiable::CredentialVerifier;

use super::types::{
    CREDENTIAL_TYPE, META_CREDENTIAL_VERIFICATION_FAILED, META_CREDENTIAL_VERIFIED,
    META_DATA_STORE_SAVE_FAILED, META_PRESENTATION_VERIFICATION_FAILED,
    META_PRESENTATION_VERIFIED, PRESENTATION_TYPE, W3C_VC_TYPE, W3C_VP_TYPE,
};

const VC_TYPE: &str = "VerifiableCredential";
const VP_TYPE: &str = "VerifiablePresentation";

enum Received {
    Credential(Box<VC>),
    Presentation(Box<VP>),
}

fn has_w3c_type(value: &Value, expected: &str) -> bool {
    match value.get("type") {
        Some(Value::Array(types)) => types.iter().any(|typ| typ.as_str() == Some(expected)),
        Some(Value::String(typ)) => typ == expected,
        _ => false,
    }
}

fn decode<T>(value: Value) -> Result<T, MessageError>
where
    T: rst_common::standard::serde::de::DeserializeOwned,
{
    serde_json::from_value(value).map_err(|err| MessageError::InvalidMessage(err.to_string()))
}

/// `CredentialHandler` verifies received credentials and presentations
///
/// It accepts both the credential exchange messages, carrying the object in their
/// body, and raw `W3C` objects. A failed verification never fails the handling,
/// the outcome is recorded as metadata and persisted along with the object
pub struct CredentialHandler {
    verifier: Arc<dyn CredentialVerifier>,
}

impl CredentialHandler {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { verifier }
    }

    fn recognize(&self, message: &Message) -> Result<Option<(TypedMessage, Received)>, MessageError> {
        if let Some(typed) = message.parse_typed() {
            let received = match typed.typ.as_str() {
                CREDENTIAL_TYPE => {
                    let body = typed.body.get("credential").cloned().unwrap_or(Value::Null);
                    Received::Credential(Box::new(decode(body)?))
                }
                PRESENTATION_TYPE => {
                    let body = typed
                        .body
                        .get("presentation")
                        .cloned()
                        .unwrap_or(Value::Null);
                    Received::Presentation(Box::new(decode(body)?))
                }
                _ => return Ok(None),
            };

            return Ok(Some((typed, received)));
        }

        let value: Value = match serde_json::from_str(message.raw()) {
            Ok(value) => value,
            Err(_) => return Ok(None),
        };

        if has_w3c_type(&value, VC_TYPE) {
            let vc: VC = decode(value.clone())?;
            let mut typed = TypedMessage::new(W3C_VC_TYPE, value);
            typed.set_id(&vc.id).set_from(&vc.issuer);
            return Ok(Some((typed, Received::Credential(Box::new(vc)))));
        }

        if has_w3c_type(&value, VP_TYPE) {
            let vp: VP = decode(value.clone())?;
            let mut typed = TypedMessage::new(W3C_VP_TYPE, value);
            if let Some(holder) = &vp.holder {
                typed.set_from(holder);
            }
            return Ok(Some((typed, Received::Presentation(Box::new(vp)))));
        }

        Ok(None)
    }

    async fn persist(&self, record: Record, ctx: &Context) -> Result<(), AgentError> {
        if !ctx.agent().has_method(METHOD_DATA_STORE_SAVE) {
            return Ok(());
        }

        let _ = ctx
            .agent()
            .execute(METHOD_DATA_STORE_SAVE, json!(record), None)
            .await?;

        Ok(())
    }

    async fn verify(
        &self,
        classified: ClassifiedMessage,
        received: Received,
        ctx: &Context,
    ) -> ClassifiedMessage {
        let (verified, mut record, (meta_ok, meta_failed)) = match received {
            Received::Credential(vc) => {
                let verified = self.verifier.verify_credential(&vc).await;
                let mut record = Record::new(
                    RecordKind::Credential,
                    json!({ "credential": vc, "verified": verified.is_ok() }),
                );
                record.set_subject(&vc.issuer).set_tag(&vc.id);

                (
                    verified,
                    record,
                    (META_CREDENTIAL_VERIFIED, META_CREDENTIAL_VERIFICATION_FAILED),
                )
            }
            Received::Presentation(vp) => {
                let verified = self.verifier.verify_presentation(&vp).await;
                let mut record = Record::new(
                    RecordKind::Presentation,
                    json!({ "presentation": vp, "verified": verified.is_ok() }),
                );
                if let Some(holder) = &vp.holder {
                    record.set_subject(holder);
                }

                (
                    verified,
                    record,
                    (META_PRESENTATION_VERIFIED, META_PRESENTATION_VERIFICATION_FAILED),
                )
            }
        };

        record.set_tag(&classified.message().id);

        let classified = match verified {
            Ok(_) => {
                info!("{} verified", classified.message().id);
                classified.add_metadata(meta_ok, None)
            }
            Err(err) => {
                warn!("{} not verified: {}", classified.message().id, err);
                classified.add_metadata(meta_failed, Some(err.to_string()))
            }
        };

        match self.persist(record, ctx).await {
            Ok(_) => classified,
            Err(err) => classified.add_metadata(META_DATA_STORE_SAVE_FAILED, Some(err.to_string())),
        }
    }
}

#[async_trait]
impl MessageHandler for CredentialHandler {
    fn name(&self) -> String {
        "credential".to_string()
    }

    async fn handle(&self, message: Message, ctx: &Context) -> Result<Outcome, MessageError> {
        let (typed, received) = match self.recognize(&message)? {
            Some(recognized) => recognized,
            None => return Ok(Outcome::Continue(message)),
        };

        let classified = self.verify(message.classify(typed), received, ctx).await;
        Ok(Outcome::Handled(classified))
    }
}
