//! Bundle source subsystem.
//!
//! # Data Flow
//! ```text
//! bundles_dir/*.yaml ──notify──→ watcher.rs (rescan)
//!     → snapshot.rs (parse manifests, diff by namespace/name)
//!     → BundleEvent channel → single consumer task
//! ```
//!
//! # Design Decisions
//! - Manifests are shaped like ConfigMaps so existing objects can be dropped in
//! - A manifest that fails to parse keeps its last good contents
//! - Resync re-emits `Update(b, b)` for every known bundle

pub mod snapshot;
pub mod watcher;

pub use snapshot::Snapshot;
pub use watcher::BundleWatcher;

use std::path::PathBuf;
use thiserror::Error;

use crate::fragment::Bundle;

/// A change observed in the bundle source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleEvent {
    Create(Bundle),
    Update(Bundle, Bundle),
    Delete(Bundle),
}

impl BundleEvent {
    /// The bundle the event is about (the new one for updates).
    pub fn bundle(&self) -> &Bundle {
        match self {
            Self::Create(b) | Self::Delete(b) => b,
            Self::Update(_, new) => new,
        }
    }
}

/// Errors raised by the bundle source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}
