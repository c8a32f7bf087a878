//! Lumenstore - data access and reconciliation core for the Lumen training platform

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use lumenstore::{
    assets::{BlobStore, HttpBlobStore},
    config::Args,
    logging,
    remote::{MongoRemoteStore, RemoteStore},
    DataService, LocalOverrideCache, SeedDataset,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    logging::init(&args.log_level);

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Lumenstore - Lumen data layer");
    info!("======================================");
    info!("Profile dir: {}", args.profile_dir.display());
    info!("Mode: {}", if args.demo_mode { "DEMO (seed + local only)" } else { "CONNECTED" });
    match &args.remote_db_uri {
        Some(uri) if args.remote_configured() => info!("Remote store: {} / {}", uri, args.remote_db_name),
        _ => info!("Remote store: none"),
    }
    match &args.blob_store_url {
        Some(url) if args.blob_store_configured() => info!("Blob store: {}", url),
        _ => info!("Blob store: none (mock upload URLs)"),
    }
    info!("======================================");

    // Connect to the remote document store (optional: offline is a supported
    // steady state, not an error)
    let remote: Option<Arc<dyn RemoteStore>> = if args.remote_configured() {
        let uri = args.remote_db_uri.as_deref().unwrap_or_default();
        match MongoRemoteStore::connect(uri, &args.remote_db_name).await {
            Ok(store) => {
                info!("Remote store connected successfully");
                Some(Arc::new(store))
            }
            Err(e) => {
                warn!("Remote store connection failed (continuing offline): {}", e);
                None
            }
        }
    } else {
        None
    };

    // Blob store client (optional)
    let blobs: Option<Arc<dyn BlobStore>> = match &args.blob_store_url {
        Some(url) if args.blob_store_configured() => {
            match HttpBlobStore::new(url.clone(), Duration::from_millis(args.request_timeout_ms)) {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    warn!("Blob store client build failed (continuing with mock URLs): {}", e);
                    None
                }
            }
        }
        _ => None,
    };

    let service = DataService::new(
        SeedDataset::builtin(),
        LocalOverrideCache::new(&args.profile_dir),
        remote,
        blobs,
    );

    // Startup diagnostics: reachability plus a merged read of each top-level
    // collection, so a deployment can verify its three tiers at a glance.
    info!(
        remote_reachable = service.is_remote_store_reachable().await,
        blob_reachable = service.is_blob_store_reachable().await,
        "Connectivity probe complete"
    );

    let organizations = service.list_organizations().await;
    let identities = service.list_identities(None).await;
    let units = service
        .list_learning_units_scoped(&lumenstore::TenantScope::All)
        .await;
    info!(
        organizations = organizations.len(),
        identities = identities.len(),
        learning_units = units.len(),
        "Merged view ready"
    );

    Ok(())
}
