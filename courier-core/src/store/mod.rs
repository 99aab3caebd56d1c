//! `store` is the persistence contract used by message and protocol handlers
//!
//! The runtime never mandates a storage engine. [`MemoryDataStore`] is provided
//! for local agents and tests.
pub mod types;
pub use types::{DataStore, Filter, Record, RecordKind, StoreError};

mod memory;
pub use memory::MemoryDataStore;

mod plugin;
pub use plugin::DataStorePlugin;
