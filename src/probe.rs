//! Connectivity probe - point-in-time reachability classification
//!
//! Each check performs one minimal, bounded-cost read and never retries;
//! callers re-invoke as needed. A permission-denied response from the blob
//! store counts as reachable (the service responded), which separates
//! "feature unavailable" from "infrastructure unavailable" in user-facing
//! status reporting. Any other failure, including timeout, classifies as
//! unreachable.

use std::sync::Arc;

use tracing::debug;

use crate::assets::BlobStore;
use crate::remote::RemoteStore;
use crate::types::RemoteError;

/// Reachability probe over the configured remote services.
#[derive(Clone, Default)]
pub struct ConnectivityProbe {
    remote: Option<Arc<dyn RemoteStore>>,
    blobs: Option<Arc<dyn BlobStore>>,
}

impl ConnectivityProbe {
    pub fn new(remote: Option<Arc<dyn RemoteStore>>, blobs: Option<Arc<dyn BlobStore>>) -> Self {
        Self { remote, blobs }
    }

    /// Whether the remote document store currently responds to a one-document
    /// read. Absent credentials classify as unreachable.
    pub async fn is_remote_store_reachable(&self) -> bool {
        let Some(remote) = &self.remote else {
            return false;
        };
        match remote.probe().await {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, "Remote store probe failed");
                false
            }
        }
    }

    /// Whether the blob store currently responds. Permission-denied is a
    /// connectivity *success* (service reachable, operation refused).
    pub async fn is_blob_store_reachable(&self) -> bool {
        let Some(blobs) = &self.blobs else {
            return false;
        };
        match blobs.probe().await {
            Ok(()) => true,
            Err(RemoteError::PermissionDenied(reason)) => {
                debug!(reason = %reason, "Blob store reachable but access denied");
                true
            }
            Err(err) => {
                debug!(error = %err, "Blob store probe failed");
                false
            }
        }
    }
}
