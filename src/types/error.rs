//! Error types for lumenstore
//!
//! Two tiers, matching the propagation policy: [`RemoteError`] is the typed
//! result kind every network adapter returns, absorbed inside the component
//! that touched the network. [`LumenError`] is what crosses the component
//! boundary to callers - effectively only validation failures and local
//! cache faults, since infrastructure failures always degrade to the
//! seed + local data path.

/// Error kind returned by remote adapters (document store, blob store).
///
/// Never propagated to consumers of `DataService`; callers branch on the
/// kind to decide between fallback and diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Service did not respond: no credentials, network down, timeout.
    #[error("remote unreachable: {0}")]
    Unreachable(String),

    /// Service responded but refused the operation. For connectivity
    /// classification this counts as "reachable".
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The requested document does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Response arrived but could not be decoded.
    #[error("malformed document: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Whether the service demonstrably responded, even if the operation
    /// itself failed. Distinguishes "feature unavailable" from
    /// "infrastructure unavailable" for status reporting.
    pub fn service_responded(&self) -> bool {
        !matches!(self, Self::Unreachable(_))
    }
}

/// Result type for remote adapter operations.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Main error type for lumenstore operations.
#[derive(Debug, thiserror::Error)]
pub enum LumenError {
    /// An identity with this email already exists in seed, local or remote
    /// data (checked case-insensitively).
    #[error("duplicate email: {0}")]
    DuplicateEmail(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// Local override cache fault (I/O or persistent version contention).
    #[error("local cache error: {0}")]
    Cache(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for LumenError {
    fn from(err: std::io::Error) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for LumenError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {}", err))
    }
}

/// Result type alias for lumenstore operations.
pub type Result<T> = std::result::Result<T, LumenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_counts_as_responded() {
        assert!(RemoteError::PermissionDenied("rules".into()).service_responded());
        assert!(RemoteError::NotFound("x".into()).service_responded());
        assert!(!RemoteError::Unreachable("timeout".into()).service_responded());
    }
}
