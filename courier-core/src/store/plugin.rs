use std::sync::Arc;

use rst_common::standard::serde::{self, Serialize};
use rst_common::standard::serde_json::Value;

use crate::agent::helpers::{output, params};
use crate::agent::{Capability, MethodSpec, Plugin, PluginError};
use crate::agent::{METHOD_DATA_STORE_QUERY, METHOD_DATA_STORE_SAVE};

use super::types::{DataStore, Filter, Record};

#[derive(Serialize)]
#[serde(crate = "self::serde")]
struct SaveOutput {
    id: String,
}

/// `DataStorePlugin` exposes a [`DataStore`] through `dataStoreSave` and `dataStoreQuery`
pub struct DataStorePlugin {
    store: Arc<dyn DataStore>,
}

impl DataStorePlugin {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    async fn save(&self, args: Value) -> Result<Value, PluginError> {
        let record: Record = params(args)?;
        let id = self.store.save(record).await?;
        output(SaveOutput { id })
    }

    async fn query(&self, args: Value) -> Result<Value, PluginError> {
        let filter: Filter = if args.is_null() {
            Filter::default()
        } else {
            params(args)?
        };

        let records = self.store.query(filter).await?;
        output(records)
    }
}

impl Plugin for DataStorePlugin {
    fn name(&self) -> String {
        "data-store".to_string()
    }

    fn methods(self: Arc<Self>) -> Vec<MethodSpec> {
        let (save, query) = (self.clone(), self.clone());

        vec![
            MethodSpec::new(METHOD_DATA_STORE_SAVE, Capability::DataStore).handler(
                move |args, _| {
                    let plugin = save.clone();
                    async move { plugin.save(args).await }
                },
            ),
            MethodSpec::new(METHOD_DATA_STORE_QUERY, Capability::DataStore).handler(
                move |args, _| {
                    let plugin = query.clone();
                    async move { plugin.query(args).await }
                },
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mockall::mock;

    use rst_common::standard::async_trait::async_trait;
    use rst_common::standard::serde_json::{self, json};
    use rst_common::with_tokio::tokio;

    use crate::agent::{Agent, AgentError};
    use crate::store::types::{RecordKind, StoreError};

    mock!(
        FakeStore{}

        #[async_trait]
        impl DataStore for FakeStore {
            async fn save(&self, record: Record) -> Result<String, StoreError>;
            async fn query(&self, filter: Filter) -> Result<Vec<Record>, StoreError>;
        }
    );

    #[tokio::test]
    async fn test_save_through_agent() {
        let mut store = MockFakeStore::new();
        store
            .expect_save()
            .withf(|record| record.kind == RecordKind::Claim)
            .times(1)
            .returning(|record| Ok(record.id));

        let agent = Agent::new(vec![Arc::new(DataStorePlugin::new(Arc::new(store)))]).unwrap();

        let record = Record::new(RecordKind::Claim, json!("Alice"));
        let saved = agent
            .execute(
                METHOD_DATA_STORE_SAVE,
                serde_json::to_value(&record).unwrap(),
                None,
            )
            .await;

        assert!(!saved.is_err());
        assert_eq!(saved.unwrap()["id"], json!(record.id))
    }

    #[tokio::test]
    async fn test_query_through_agent() {
        let mut store = MockFakeStore::new();
        store
            .expect_query()
            .withf(|filter| filter.tag == Some("email".to_string()))
            .times(1)
            .returning(|_| Ok(vec![Record::new(RecordKind::Claim, json!("a@example.com"))]));

        let agent = Agent::new(vec![Arc::new(DataStorePlugin::new(Arc::new(store)))]).unwrap();
        let records: Result<Vec<Record>, AgentError> = agent
            .execute_as(METHOD_DATA_STORE_QUERY, json!({ "tag": "email" }), None)
            .await;

        assert!(!records.is_err());
        assert_eq!(records.unwrap().len(), 1)
    }

    #[tokio::test]
    async fn test_save_failed() {
        let mut store = MockFakeStore::new();
        store
            .expect_save()
            .returning(|_| Err(StoreError::SaveError("disk full".to_string())));

        let agent = Agent::new(vec![Arc::new(DataStorePlugin::new(Arc::new(store)))]).unwrap();
        let record = Record::new(RecordKind::Message, json!("hello"));
        let saved = agent
            .execute(
                METHOD_DATA_STORE_SAVE,
                serde_json::to_value(&record).unwrap(),
                None,
            )
            .await;

        assert!(matches!(
            saved.unwrap_err().cause(),
            Some(PluginError::Store(StoreError::SaveError(_)))
        ))
    }
}
