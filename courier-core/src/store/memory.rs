use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::debug;
use rst_common::with_tokio::tokio::sync::RwLock;

use super::types::{DataStore, Filter, Record, StoreError};

/// `MemoryDataStore` keeps records in memory, in insertion order
#[derive(Default)]
pub struct MemoryDataStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn save(&self, record: Record) -> Result<String, StoreError> {
        let mut records = self.records.write().await;
        if records.iter().any(|saved| saved.id == record.id) {
            return Err(StoreError::SaveError(format!(
                "record already exists: {}",
                record.id
            )));
        }

        debug!("saving record {} of kind {:?}", record.id, record.kind);

        let id = record.id.clone();
        records.push(record);
        Ok(id)
    }

    async fn query(&self, filter: Filter) -> Result<Vec<Record>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}
