use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};
use rst_common::standard::uuid::Uuid;
use rst_common::with_errors::thiserror::{self, Error};

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum StoreError {
    #[error("save error: {0}")]
    SaveError(String),

    #[error("query error: {0}")]
    QueryError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Message,
    Credential,
    Presentation,
    Claim,
    Disclosure,
}

/// `Record` is a single entry persisted by a [`DataStore`]
///
/// `subject` and `tag` are free-form lookup keys. Claims use `subject` for the
/// identifier the claim is about and `tag` for the claim type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct Record {
    pub id: String,
    pub kind: RecordKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub tag: Option<String>,

    pub data: Value,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Record {
    pub fn new(kind: RecordKind, data: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            subject: None,
            tag: None,
            data,
            created_at: Utc::now(),
        }
    }

    pub fn set_subject(&mut self, subject: &str) -> &mut Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn set_tag(&mut self, tag: &str) -> &mut Self {
        self.tag = Some(tag.to_string());
        self
    }
}

impl ToJSON for Record {
    fn to_json(&self) -> Result<String, BaseError> {
        let json_str =
            serde_json::to_string(&self).map_err(|err| BaseError::ToJSONError(err.to_string()))?;

        Ok(json_str)
    }
}

/// `Filter` selects records, an empty filter selects everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub kind: Option<RecordKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub tag: Option<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: RecordKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        let kind = self.kind.map_or(true, |kind| kind == record.kind);
        let subject = self
            .subject
            .as_ref()
            .map_or(true, |subject| record.subject.as_ref() == Some(subject));
        let tag = self
            .tag
            .as_ref()
            .map_or(true, |tag| record.tag.as_ref() == Some(tag));

        kind && subject && tag
    }
}

/// `DataStore` is the persistence port consumed by message and protocol handlers
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn save(&self, record: Record) -> Result<String, StoreError>;
    async fn query(&self, filter: Filter) -> Result<Vec<Record>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::standard::serde_json::json;

    use table_test::table_test;

    #[test]
    fn test_filter_matches() {
        let mut record = Record::new(RecordKind::Claim, json!("alice@example.com"));
        record.set_subject("did:example:alice").set_tag("email");

        let table = vec![
            (Filter::new(), true),
            (Filter::new().kind(RecordKind::Claim), true),
            (Filter::new().kind(RecordKind::Message), false),
            (
                Filter::new()
                    .kind(RecordKind::Claim)
                    .subject("did:example:alice")
                    .tag("email"),
                true,
            ),
            (Filter::new().subject("did:example:bob"), false),
            (Filter::new().tag("name"), false),
        ];

        for (validator, input, expected) in table_test!(table) {
            let actual = input.matches(&record);

            validator
                .given(&format!("{:?}", input))
                .when("matches")
                .then(&format!("it should be {}", expected))
                .assert_eq(expected, actual);
        }
    }

    #[test]
    fn test_record_serialize() {
        let record = Record::new(RecordKind::Credential, json!({ "id": "vc-1" }));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["kind"], json!("credential"));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("subject").is_none());

        let json_str = record.to_json();
        assert!(!json_str.is_err())
    }
}
