//! Lumenstore - data access and reconciliation core for the Lumen training platform
//!
//! Presents one consistent view of organizations, identities, learning units,
//! tasks and submissions drawn from three disagreeing sources:
//!
//! - **SeedDataset**: immutable baseline records shipped with the system
//! - **LocalOverrideCache**: durable per-profile store of records written
//!   while the remote path was unavailable (or as a shadow of remote writes)
//! - **RemoteStore**: a networked document database that may be absent,
//!   reachable-but-empty, or reachable-with-data
//!
//! Reads fan out to the remote store and the local cache, are reduced by the
//! [`merge`] engine under fixed precedence (seed < remote < local), and are
//! tenant-scoped after the merge. Writes commit locally first, then attempt
//! the remote store; a remote failure is absorbed, never surfaced.
//!
//! ## Services
//!
//! - **DataService**: the single facade the UI layer consumes
//! - **ProgressionEngine**: monotonic XP accrual, rank transitions, badges
//! - **AssetUploadGateway**: blob upload with deterministic offline fallback
//! - **ConnectivityProbe**: point-in-time reachability classification

pub mod assets;
pub mod config;
pub mod flow;
pub mod local;
pub mod logging;
pub mod merge;
pub mod model;
pub mod probe;
pub mod progression;
pub mod remote;
pub mod seed;
pub mod service;
pub mod types;

pub use config::Args;
pub use local::LocalOverrideCache;
pub use merge::{merge, TenantScope};
pub use probe::ConnectivityProbe;
pub use progression::{AwardOutcome, ProgressionEngine};
pub use seed::SeedDataset;
pub use service::DataService;
pub use types::{LumenError, RemoteError, Result};
