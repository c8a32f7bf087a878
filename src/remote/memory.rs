//! In-memory remote store
//!
//! Backs demo deployments and tests: same contract as the MongoDB adapter,
//! plus switches that simulate an unreachable service or a security-rules
//! denial.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::types::{RemoteError, RemoteResult};

use super::{FieldFilter, RemoteStore};

/// Remote store held entirely in memory.
#[derive(Default)]
pub struct MemoryRemoteStore {
    collections: DashMap<String, Vec<(String, JsonValue)>>,
    unreachable: AtomicBool,
    permission_denied: AtomicBool,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the service not responding at all.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Simulate the service responding but denying every operation.
    pub fn set_permission_denied(&self, denied: bool) {
        self.permission_denied.store(denied, Ordering::SeqCst);
    }

    fn check_available(&self, context: &str) -> RemoteResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RemoteError::Unreachable(format!("{context}: simulated outage")));
        }
        if self.permission_denied.load(Ordering::SeqCst) {
            return Err(RemoteError::PermissionDenied(format!(
                "{context}: denied by security rules"
            )));
        }
        Ok(())
    }

    /// Number of documents currently held in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn probe(&self) -> RemoteResult<()> {
        self.check_available("probe")
    }

    async fn list(
        &self,
        collection: &str,
        filter: Option<&FieldFilter>,
    ) -> RemoteResult<Vec<JsonValue>> {
        self.check_available("list")?;
        let entries = match self.collections.get(collection) {
            Some(entries) => entries.clone(),
            None => return Ok(Vec::new()),
        };
        Ok(entries
            .into_iter()
            .map(|(_, doc)| doc)
            .filter(|doc| match filter {
                Some(f) => doc.get(&f.field).and_then(JsonValue::as_str) == Some(f.value.as_str()),
                None => true,
            })
            .collect())
    }

    async fn get(&self, collection: &str, id: &str) -> RemoteResult<Option<JsonValue>> {
        self.check_available("get")?;
        Ok(self.collections.get(collection).and_then(|entries| {
            entries
                .iter()
                .find(|(key, _)| key == id)
                .map(|(_, doc)| doc.clone())
        }))
    }

    async fn put(&self, collection: &str, id: &str, doc: JsonValue) -> RemoteResult<()> {
        self.check_available("put")?;
        let mut entries = self.collections.entry(collection.to_string()).or_default();
        match entries.iter_mut().find(|(key, _)| key == id) {
            Some((_, existing)) => *existing = doc,
            None => entries.push((id.to_string(), doc)),
        }
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: JsonValue) -> RemoteResult<()> {
        self.check_available("update")?;
        let mut entries = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| RemoteError::NotFound(format!("{collection}/{id}")))?;
        let (_, existing) = entries
            .iter_mut()
            .find(|(key, _)| key == id)
            .ok_or_else(|| RemoteError::NotFound(format!("{collection}/{id}")))?;
        crate::local::merge_fields(existing, &fields);
        Ok(())
    }

    async fn append(&self, collection: &str, doc: JsonValue) -> RemoteResult<String> {
        self.check_available("append")?;
        let key = Uuid::new_v4().to_string();
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push((key.clone(), doc));
        Ok(key)
    }
}
