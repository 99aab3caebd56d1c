use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::Utc;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};
use rst_common::standard::uuid::Uuid;
use rst_common::with_errors::thiserror::{self, Error};

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::agent::{AgentError, Context};
use crate::didcomm::types::DIDCommError;

/// `MessageError` is the failure of handling a single message
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("unhandled message")]
    Unhandled(Box<Message>),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("didcomm error: {0}")]
    DIDComm(#[from] DIDCommError),

    #[error("agent error: {0}")]
    Agent(#[from] Box<AgentError>),

    #[error("json error: {0}")]
    JSONError(String),
}

impl From<AgentError> for MessageError {
    fn from(value: AgentError) -> Self {
        MessageError::Agent(Box::new(value))
    }
}

/// `MetaData` is a single audit trail entry attached to a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct MetaData {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub value: Option<String>,
}

impl MetaData {
    pub fn new(kind: &str, value: Option<String>) -> Self {
        Self {
            kind: kind.to_string(),
            value,
        }
    }
}

/// `TypedMessage` is the plaintext message exchanged between agents
///
/// Field names are part of the wire format and must be kept as is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct TypedMessage {
    #[serde(rename = "type")]
    pub typ: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub from: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub to: Option<String>,

    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub thid: Option<String>,

    #[serde(default)]
    pub body: Value,

    #[serde(rename = "createdTime")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub created_time: Option<i64>,

    #[serde(rename = "expiresTime")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub expires_time: Option<i64>,
}

impl TypedMessage {
    pub fn new(typ: &str, body: Value) -> Self {
        Self {
            typ: typ.to_string(),
            from: None,
            to: None,
            id: Uuid::new_v4().to_string(),
            thid: None,
            body,
            created_time: Some(Utc::now().timestamp()),
            expires_time: None,
        }
    }

    pub fn set_id(&mut self, id: &str) -> &mut Self {
        self.id = id.to_string();
        self
    }

    pub fn set_from(&mut self, from: &str) -> &mut Self {
        self.from = Some(from.to_string());
        self
    }

    pub fn set_to(&mut self, to: &str) -> &mut Self {
        self.to = Some(to.to_string());
        self
    }

    pub fn set_thid(&mut self, thid: &str) -> &mut Self {
        self.thid = Some(thid.to_string());
        self
    }

    pub fn set_expires_time(&mut self, expires_time: i64) -> &mut Self {
        self.expires_time = Some(expires_time);
        self
    }

    /// `reply` builds a message correlated to this one, with `from` and `to` swapped
    pub fn reply(&self, typ: &str, body: Value) -> Self {
        let mut reply = TypedMessage::new(typ, body);
        reply.thid = Some(self.id.clone());
        reply.from = self.to.clone();
        reply.to = self.from.clone();
        reply
    }
}

impl ToJSON for TypedMessage {
    fn to_json(&self) -> Result<String, BaseError> {
        let json_str =
            serde_json::to_string(&self).map_err(|err| BaseError::ToJSONError(err.to_string()))?;

        Ok(json_str)
    }
}

/// `Message` is a received payload that has not been classified yet
///
/// Metadata entries are append-only, any handler may add entries but no
/// handler is able to remove them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct Message {
    raw: String,
    save: bool,
    metadata: Vec<MetaData>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    typed: Option<TypedMessage>,
}

impl Message {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            save: false,
            metadata: Vec::new(),
            typed: None,
        }
    }

    pub fn with_save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    pub fn add_metadata(mut self, kind: &str, value: Option<String>) -> Self {
        self.metadata.push(MetaData::new(kind, value));
        self
    }

    /// `unwrap_into` replaces the payload with its unwrapped plaintext form
    pub fn unwrap_into(mut self, raw: String, typed: TypedMessage) -> Self {
        self.raw = raw;
        self.typed = Some(typed);
        self
    }

    pub fn classify(self, typed: TypedMessage) -> ClassifiedMessage {
        ClassifiedMessage {
            raw: self.raw,
            save: self.save,
            metadata: self.metadata,
            message: typed,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn save(&self) -> bool {
        self.save
    }

    pub fn metadata(&self) -> &[MetaData] {
        &self.metadata
    }

    pub fn typed(&self) -> Option<&TypedMessage> {
        self.typed.as_ref()
    }

    /// `parse_typed` returns the unwrapped plaintext, or tries to read the raw
    /// payload as a plaintext message
    pub fn parse_typed(&self) -> Option<TypedMessage> {
        self.typed
            .clone()
            .or_else(|| serde_json::from_str(&self.raw).ok())
    }

    /// `message_type` returns the type of the unwrapped plaintext, if any
    pub fn message_type(&self) -> Option<&str> {
        self.typed.as_ref().map(|typed| typed.typ.as_str())
    }
}

/// `ClassifiedMessage` is a message a handler has fully interpreted
///
/// A classified message always carries a [`TypedMessage`], so its type is always set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct ClassifiedMessage {
    raw: String,
    save: bool,
    metadata: Vec<MetaData>,
    message: TypedMessage,
}

impl ClassifiedMessage {
    pub fn add_metadata(mut self, kind: &str, value: Option<String>) -> Self {
        self.metadata.push(MetaData::new(kind, value));
        self
    }

    pub fn typ(&self) -> &str {
        &self.message.typ
    }

    pub fn message(&self) -> &TypedMessage {
        &self.message
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn save(&self) -> bool {
        self.save
    }

    pub fn metadata(&self) -> &[MetaData] {
        &self.metadata
    }

    pub fn find_metadata(&self, kind: &str) -> Option<&MetaData> {
        self.metadata.iter().find(|meta| meta.kind == kind)
    }
}

/// `Outcome` is the explicit result of offering a message to a single handler
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The handler fully interpreted the message, the chain stops here
    Handled(ClassifiedMessage),

    /// The message is offered to the next handler, either untouched or transformed
    Continue(Message),
}

/// `MessageHandler` is a single member of a [`super::HandlerChain`]
///
/// A handler that doesn't recognize a message must return it untouched through
/// [`Outcome::Continue`]. Errors are reserved to messages the handler recognized
/// but failed to interpret
#[async_trait]
pub trait MessageHandler: Send + Sync {
    fn name(&self) -> String;
    async fn handle(&self, message: Message, ctx: &Context) -> Result<Outcome, MessageError>;
}
