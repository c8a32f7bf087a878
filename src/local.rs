//! Local override cache - durable per-profile store
//!
//! Holds records created or mutated while the remote store was unavailable
//! (or as a shadow of successful remote writes). One JSON file per
//! collection namespace under the profile directory, each a versioned
//! envelope:
//!
//! ```json
//! { "version": 12, "records": [ ... ] }
//! ```
//!
//! Reads default to empty on missing or corrupt data, never error. Every
//! mutation rewrites the full collection - acceptable because per-profile
//! working sets are tens to low hundreds of records.
//!
//! Mutations hold an exclusive per-namespace lock file for the duration of
//! the read-modify-write cycle, so two concurrent logical writers (e.g.
//! browser-tab-style profiles sharing one cache) cannot silently lose an
//! update. The envelope version stamp detects stale reads for callers that
//! load and store across an await point ([`LocalOverrideCache::store_versioned`]).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::types::LumenError;

/// Attempts to take the namespace lock before giving up.
const LOCK_WAIT_ATTEMPTS: usize = 400;
/// Pause between lock attempts.
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(5);
/// A lock file older than this belongs to a crashed holder and is broken.
/// Must be well below `LOCK_WAIT_ATTEMPTS * LOCK_RETRY_DELAY` so waiters
/// outlive it; a live holder only keeps the lock for one small-file
/// read-and-rewrite.
const LOCK_STALE_AFTER: Duration = Duration::from_millis(500);

/// Local cache failure kinds.
#[derive(Debug, thiserror::Error)]
pub enum LocalCacheError {
    /// The envelope version changed between read and write.
    #[error("version mismatch in '{namespace}': expected {expected}, found {found}")]
    VersionMismatch {
        namespace: String,
        expected: u64,
        found: u64,
    },

    /// The namespace lock could not be taken within the wait bound.
    #[error("persistent write contention in '{0}'")]
    Contention(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<LocalCacheError> for LumenError {
    fn from(err: LocalCacheError) -> Self {
        Self::Cache(err.to_string())
    }
}

/// Exclusive advisory lock on one namespace, held via a sibling `.lock`
/// file created with `create_new` (atomic on every platform the cache
/// targets). Released on drop.
struct NamespaceLock {
    path: PathBuf,
}

impl NamespaceLock {
    fn acquire(namespace: &str, path: PathBuf) -> Result<Self, LocalCacheError> {
        for _ in 0..LOCK_WAIT_ATTEMPTS {
            match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    let stale = fs::metadata(&path)
                        .and_then(|meta| meta.modified())
                        .ok()
                        .and_then(|modified| modified.elapsed().ok())
                        .is_some_and(|age| age > LOCK_STALE_AFTER);
                    if stale {
                        // Holder crashed mid-write; break the lock and race
                        // for a fresh one.
                        warn!(namespace, "Breaking stale namespace lock");
                        let _ = fs::remove_file(&path);
                        continue;
                    }
                    std::thread::sleep(LOCK_RETRY_DELAY);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(LocalCacheError::Contention(namespace.to_string()))
    }
}

impl Drop for NamespaceLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// On-disk envelope: version stamp plus the full record list.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Envelope {
    #[serde(default)]
    version: u64,
    #[serde(default)]
    records: Vec<JsonValue>,
}

/// Durable per-profile key/value store, namespaced per collection.
#[derive(Debug, Clone)]
pub struct LocalOverrideCache {
    root: PathBuf,
}

impl LocalOverrideCache {
    /// Open (or lazily create) a cache rooted at the given profile directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, namespace: &str) -> PathBuf {
        self.root.join(format!("{namespace}.json"))
    }

    fn lock(&self, namespace: &str) -> Result<NamespaceLock, LocalCacheError> {
        fs::create_dir_all(&self.root)?;
        NamespaceLock::acquire(namespace, self.root.join(format!("{namespace}.lock")))
    }

    fn read_envelope(&self, namespace: &str) -> Envelope {
        let path = self.path(namespace);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(_) => return Envelope::default(),
        };
        match serde_json::from_slice(&raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                // Corrupt data is treated as an empty collection, never an error.
                warn!(
                    namespace = namespace,
                    error = %err,
                    "Corrupt local cache file, treating as empty"
                );
                Envelope::default()
            }
        }
    }

    fn write_envelope(&self, namespace: &str, envelope: &Envelope) -> Result<(), LocalCacheError> {
        fs::create_dir_all(&self.root)?;
        let path = self.path(namespace);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(envelope)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Load a namespace as typed records. Records that fail to decode are
    /// skipped with a warning rather than poisoning the whole collection.
    pub fn load<T: DeserializeOwned>(&self, namespace: &str) -> Vec<T> {
        self.read_envelope(namespace)
            .records
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<T>(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(namespace = namespace, error = %err, "Skipping undecodable cached record");
                    None
                }
            })
            .collect()
    }

    /// Load raw records together with the envelope version, for callers that
    /// run their own read-modify-write cycle.
    pub fn load_versioned(&self, namespace: &str) -> (Vec<JsonValue>, u64) {
        let envelope = self.read_envelope(namespace);
        (envelope.records, envelope.version)
    }

    /// Store raw records if the on-disk version still matches `expected`.
    /// The check and the write happen under the namespace lock, so two
    /// writers holding the same version cannot both pass the check.
    pub fn store_versioned(
        &self,
        namespace: &str,
        records: Vec<JsonValue>,
        expected: u64,
    ) -> Result<(), LocalCacheError> {
        let _lock = self.lock(namespace)?;
        let current = self.read_envelope(namespace).version;
        if current != expected {
            return Err(LocalCacheError::VersionMismatch {
                namespace: namespace.to_string(),
                expected,
                found: current,
            });
        }
        let envelope = Envelope {
            version: expected + 1,
            records,
        };
        self.write_envelope(namespace, &envelope)?;
        debug!(
            namespace = namespace,
            version = envelope.version,
            count = envelope.records.len(),
            "Local cache persisted"
        );
        Ok(())
    }

    /// Run one read-modify-write cycle under the namespace lock. The whole
    /// cycle is mutually exclusive with every other mutation of the same
    /// namespace, so concurrent writers on a shared profile serialize
    /// instead of overwriting each other.
    pub fn modify<R, F>(&self, namespace: &str, apply: F) -> Result<R, LocalCacheError>
    where
        F: FnOnce(&mut Vec<JsonValue>) -> R,
    {
        let _lock = self.lock(namespace)?;
        let envelope = self.read_envelope(namespace);
        let mut records = envelope.records;
        let result = apply(&mut records);
        self.write_envelope(
            namespace,
            &Envelope {
                version: envelope.version + 1,
                records,
            },
        )?;
        Ok(result)
    }

    /// Append a record to a log-style namespace (submissions).
    pub fn append<T: Serialize>(&self, namespace: &str, record: &T) -> Result<(), LocalCacheError> {
        let value = serde_json::to_value(record)?;
        self.modify(namespace, |records| records.push(value))
    }

    /// Insert or replace a record in a keyed namespace, matching on its
    /// `"id"` field. Keeps point lookups unambiguous: at most one local copy
    /// per logical id.
    pub fn upsert<T: Serialize>(&self, namespace: &str, record: &T) -> Result<(), LocalCacheError> {
        let value = serde_json::to_value(record)?;
        let id = value
            .get("id")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
        self.modify(namespace, |records| {
            let slot = id.as_deref().and_then(|id| {
                records
                    .iter_mut()
                    .find(|existing| existing.get("id").and_then(JsonValue::as_str) == Some(id))
            });
            match slot {
                Some(existing) => *existing = value,
                None => records.push(value),
            }
        })
    }

    /// Merge partial fields into one cached record. Only learning units need
    /// structural edits without a remote round-trip; other collections are
    /// rewritten whole via [`Self::upsert`].
    ///
    /// Returns `false` when no cached record carries the id.
    pub fn patch(
        &self,
        namespace: &str,
        id: &str,
        fields: &JsonValue,
    ) -> Result<bool, LocalCacheError> {
        self.modify(namespace, |records| {
            let mut found = false;
            for record in records.iter_mut() {
                if record.get("id").and_then(JsonValue::as_str) == Some(id) {
                    merge_fields(record, fields);
                    found = true;
                }
            }
            found
        })
    }
}

/// Shallow-merge `fields` object keys into `target`.
pub(crate) fn merge_fields(target: &mut JsonValue, fields: &JsonValue) {
    if let (Some(target_map), Some(field_map)) = (target.as_object_mut(), fields.as_object()) {
        for (key, value) in field_map {
            target_map.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_missing_namespace_loads_empty() {
        let dir = tempdir().expect("tempdir");
        let cache = LocalOverrideCache::new(dir.path());
        let records: Vec<JsonValue> = cache.load("identities");
        assert!(records.is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir_all(dir.path()).expect("mkdir");
        fs::write(dir.path().join("tasks.json"), b"{not json!").expect("write");
        let cache = LocalOverrideCache::new(dir.path());
        let records: Vec<JsonValue> = cache.load("tasks");
        assert!(records.is_empty());
    }

    #[test]
    fn test_append_persists_and_bumps_version() {
        let dir = tempdir().expect("tempdir");
        let cache = LocalOverrideCache::new(dir.path());

        cache
            .append("submissions", &json!({"id": "SUB-1", "response": "a"}))
            .expect("append");
        cache
            .append("submissions", &json!({"id": "SUB-2", "response": "b"}))
            .expect("append");

        let (records, version) = cache.load_versioned("submissions");
        assert_eq!(records.len(), 2);
        assert_eq!(version, 2);
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let dir = tempdir().expect("tempdir");
        let cache = LocalOverrideCache::new(dir.path());

        cache
            .upsert("identities", &json!({"id": "USR-1", "xp": 100}))
            .expect("upsert");
        cache
            .upsert("identities", &json!({"id": "USR-1", "xp": 250}))
            .expect("upsert");

        let records: Vec<JsonValue> = cache.load("identities");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["xp"], 250);
    }

    #[test]
    fn test_patch_merges_fields() {
        let dir = tempdir().expect("tempdir");
        let cache = LocalOverrideCache::new(dir.path());

        cache
            .upsert(
                "learning-units",
                &json!({"id": "ALG-101", "title": "Algebra", "progress": 45}),
            )
            .expect("upsert");

        let found = cache
            .patch("learning-units", "ALG-101", &json!({"progress": 80}))
            .expect("patch");
        assert!(found);

        let records: Vec<JsonValue> = cache.load("learning-units");
        assert_eq!(records[0]["progress"], 80);
        assert_eq!(records[0]["title"], "Algebra");

        let missing = cache
            .patch("learning-units", "NOPE", &json!({"progress": 1}))
            .expect("patch");
        assert!(!missing);
    }

    #[test]
    fn test_stale_version_rejected() {
        let dir = tempdir().expect("tempdir");
        let cache = LocalOverrideCache::new(dir.path());

        let (records, version) = cache.load_versioned("identities");
        assert_eq!(version, 0);
        cache
            .store_versioned("identities", records.clone(), version)
            .expect("first write");

        // A second writer holding the old version loses the race.
        let result = cache.store_versioned("identities", records, version);
        assert!(matches!(
            result,
            Err(LocalCacheError::VersionMismatch { expected: 0, found: 1, .. })
        ));
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        let dir = tempdir().expect("tempdir");

        // Four writers hammer one namespace from separate threads; every
        // append must survive and the version must count every write.
        let handles: Vec<_> = (0..4)
            .map(|writer| {
                let cache = LocalOverrideCache::new(dir.path());
                std::thread::spawn(move || {
                    for seq in 0..50 {
                        cache
                            .append("submissions", &json!({"writer": writer, "seq": seq}))
                            .expect("append");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("join");
        }

        let cache = LocalOverrideCache::new(dir.path());
        let (records, version) = cache.load_versioned("submissions");
        assert_eq!(records.len(), 200);
        assert_eq!(version, 200);
    }

    #[test]
    fn test_stale_lock_broken_not_fatal() {
        let dir = tempdir().expect("tempdir");
        let cache = LocalOverrideCache::new(dir.path());

        // A crashed holder's leftover lock file ages past the staleness
        // bound and gets broken instead of wedging every future write.
        fs::create_dir_all(dir.path()).expect("mkdir");
        fs::write(dir.path().join("tasks.lock"), b"").expect("write lock");
        std::thread::sleep(LOCK_STALE_AFTER + Duration::from_millis(50));

        cache
            .append("tasks", &json!({"id": "T-1"}))
            .expect("append");
        let records: Vec<JsonValue> = cache.load("tasks");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_undecodable_record_skipped_not_fatal() {
        #[derive(Debug, Deserialize)]
        struct Strict {
            id: String,
        }

        let dir = tempdir().expect("tempdir");
        let cache = LocalOverrideCache::new(dir.path());
        cache
            .append("tasks", &json!({"id": "T-1"}))
            .expect("append");
        cache.append("tasks", &json!({"id": 42})).expect("append");

        let records: Vec<Strict> = cache.load("tasks");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "T-1");
    }
}
