//! Shared types for lumenstore

pub mod error;

pub use error::{LumenError, RemoteError, RemoteResult, Result};
