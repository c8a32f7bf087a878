//! Remote document store adapter
//!
//! The trait is type-agnostic over named collections and JSON documents, the
//! same shape the service layer persists locally. Every implementation
//! converts transport and driver errors into a [`RemoteError`] kind - a
//! remote failure never propagates as a panic or a raw driver error, because
//! degraded operation on seed + local data is always the fallback.
//!
//! Writes are idempotent by id (`put` is an upsert), except submission
//! creation, which is append-only with store-assigned keys.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::types::RemoteResult;

pub use memory::MemoryRemoteStore;
pub use mongo::MongoRemoteStore;

/// Single field-equals constraint, the only filter shape the engine needs
/// (organization id, unit id, email).
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Adapter to a networked document database.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Minimal bounded-cost read used for reachability classification:
    /// fetch at most one document.
    async fn probe(&self) -> RemoteResult<()>;

    /// List documents in a collection, optionally constrained to one
    /// field-equals filter.
    async fn list(
        &self,
        collection: &str,
        filter: Option<&FieldFilter>,
    ) -> RemoteResult<Vec<JsonValue>>;

    /// Point lookup by logical id.
    async fn get(&self, collection: &str, id: &str) -> RemoteResult<Option<JsonValue>>;

    /// Upsert a document under its logical id.
    async fn put(&self, collection: &str, id: &str, doc: JsonValue) -> RemoteResult<()>;

    /// Merge partial fields into an existing document. Missing documents
    /// report `NotFound`; there is no implicit insert.
    async fn update(&self, collection: &str, id: &str, fields: JsonValue) -> RemoteResult<()>;

    /// Append a document with a store-assigned key, returning that key.
    async fn append(&self, collection: &str, doc: JsonValue) -> RemoteResult<String>;
}

/// Decode raw documents into typed records, skipping (and logging) any that
/// fail to decode rather than failing the whole read.
pub fn decode_records<T: DeserializeOwned>(collection: &str, docs: Vec<JsonValue>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| match serde_json::from_value::<T>(doc) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(collection = collection, error = %err, "Skipping undecodable remote document");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Rec {
        id: String,
    }

    #[test]
    fn test_decode_records_skips_malformed() {
        let docs = vec![json!({"id": "a"}), json!({"id": 7}), json!({"id": "b"})];
        let records: Vec<Rec> = decode_records("tasks", docs);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
