//! Configuration
//!
//! CLI arguments and environment variable handling using clap.

use std::path::PathBuf;

use clap::Parser;

/// Lumenstore - data access and reconciliation core for the Lumen training platform
#[derive(Parser, Debug, Clone)]
#[command(name = "lumenstore")]
#[command(about = "Offline-tolerant data layer for the Lumen training platform")]
pub struct Args {
    /// Remote document store connection URI (absent means offline operation)
    #[arg(long, env = "REMOTE_DB_URI")]
    pub remote_db_uri: Option<String>,

    /// Remote database name
    #[arg(long, env = "REMOTE_DB_NAME", default_value = "lumen")]
    pub remote_db_name: String,

    /// Directory holding the per-profile local override cache
    #[arg(long, env = "PROFILE_DIR", default_value = ".lumen/profile")]
    pub profile_dir: PathBuf,

    /// Blob store base URL for asset uploads (absent means mock URLs only)
    #[arg(long, env = "BLOB_STORE_URL")]
    pub blob_store_url: Option<String>,

    /// Demo mode: ignore any configured remote services and run on seed +
    /// local data only
    #[arg(long, env = "DEMO_MODE", default_value = "false")]
    pub demo_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Request timeout in milliseconds for remote service calls
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,
}

impl Args {
    /// Whether a remote document store should be connected at startup.
    pub fn remote_configured(&self) -> bool {
        !self.demo_mode && self.remote_db_uri.is_some()
    }

    /// Whether a blob store should be connected at startup.
    pub fn blob_store_configured(&self) -> bool {
        !self.demo_mode && self.blob_store_url.is_some()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.remote_db_name.is_empty() {
            return Err("REMOTE_DB_NAME must not be empty".to_string());
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_from(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).expect("parse")
    }

    #[test]
    fn test_defaults_are_offline() {
        let args = args_from(&["lumenstore"]);
        assert!(!args.remote_configured());
        assert!(!args.blob_store_configured());
        assert_eq!(args.remote_db_name, "lumen");
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_demo_mode_overrides_remote_uri() {
        let args = args_from(&[
            "lumenstore",
            "--remote-db-uri",
            "mongodb://localhost:27017",
            "--demo-mode",
        ]);
        assert!(!args.remote_configured());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let args = args_from(&["lumenstore", "--request-timeout-ms", "0"]);
        assert!(args.validate().is_err());
    }
}
