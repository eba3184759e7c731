//! Fragment persistence subsystem.
//!
//! # Data Flow
//! ```text
//! Reconciler / Backlog
//!     → StoreSet (picks the active, backlog or base-config slot)
//!     → FragmentStore (file.rs on disk, memory.rs in tests)
//! ```
//!
//! # Layout under `config_path`
//! ```text
//! routes/            backup-routes/
//! receivers/         backup-receivers/
//! inhibit-rules/     backup-inhibit-rules/
//! alertmanager.yml
//! ```
//! Base-config fragments live next to the template.
//!
//! # Design Decisions
//! - One file per fragment; the directory is the database
//! - Enumeration is lexicographic by file name so assembly is deterministic
//! - Deleting a missing fragment is not an error

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::path::PathBuf;
use thiserror::Error;

use crate::config::InstanceIdentity;
use crate::fragment::{Fragment, FragmentKind};
use crate::routing::ensure_continue;

/// Errors raised by a fragment store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Key/value persistence for fragments of one kind.
pub trait FragmentStore: Send + std::fmt::Debug {
    /// Write a fragment, replacing any previous payload.
    fn write(&mut self, file_name: &str, payload: &str) -> StoreResult<()>;

    /// Remove a fragment. Returns whether it existed.
    fn delete(&mut self, file_name: &str) -> StoreResult<bool>;

    /// Read one fragment.
    fn read(&self, file_name: &str) -> StoreResult<Option<String>>;

    /// Every fragment as `(file_name, payload)`, sorted by file name.
    fn entries(&self) -> StoreResult<Vec<(String, String)>>;

    /// Concatenation of every payload, each followed by a newline.
    fn read_all(&self) -> StoreResult<String> {
        let mut out = String::new();
        for (_, payload) in self.entries()? {
            out.push_str(&payload);
            out.push('\n');
        }
        Ok(out)
    }

    fn contains(&self, file_name: &str) -> StoreResult<bool> {
        Ok(self.read(file_name)?.is_some())
    }

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.entries()?.is_empty())
    }
}

/// All stores used by one controller instance.
#[derive(Debug)]
pub struct StoreSet {
    routes: Box<dyn FragmentStore>,
    receivers: Box<dyn FragmentStore>,
    inhibit_rules: Box<dyn FragmentStore>,
    backup_routes: Box<dyn FragmentStore>,
    backup_receivers: Box<dyn FragmentStore>,
    backup_inhibit_rules: Box<dyn FragmentStore>,
    base_config: Box<dyn FragmentStore>,
}

impl StoreSet {
    /// File-backed stores in the standard layout.
    pub fn on_disk(identity: &InstanceIdentity) -> Self {
        let dir = |name: &str| -> Box<dyn FragmentStore> {
            Box::new(FileStore::new(identity.config_path.join(name)))
        };
        Self {
            routes: dir("routes"),
            receivers: dir("receivers"),
            inhibit_rules: dir("inhibit-rules"),
            backup_routes: dir("backup-routes"),
            backup_receivers: dir("backup-receivers"),
            backup_inhibit_rules: dir("backup-inhibit-rules"),
            base_config: Box::new(FileStore::new(identity.template_dir())),
        }
    }

    /// Memory-backed stores.
    pub fn in_memory() -> Self {
        Self {
            routes: Box::new(MemoryStore::new()),
            receivers: Box::new(MemoryStore::new()),
            inhibit_rules: Box::new(MemoryStore::new()),
            backup_routes: Box::new(MemoryStore::new()),
            backup_receivers: Box::new(MemoryStore::new()),
            backup_inhibit_rules: Box::new(MemoryStore::new()),
            base_config: Box::new(MemoryStore::new()),
        }
    }

    /// Active store for a kind (the base-config slot for `BaseConfig`).
    pub fn active(&self, kind: FragmentKind) -> &dyn FragmentStore {
        match kind {
            FragmentKind::Route => self.routes.as_ref(),
            FragmentKind::Receiver => self.receivers.as_ref(),
            FragmentKind::InhibitRule => self.inhibit_rules.as_ref(),
            FragmentKind::BaseConfig => self.base_config.as_ref(),
        }
    }

    fn active_mut(&mut self, kind: FragmentKind) -> &mut dyn FragmentStore {
        match kind {
            FragmentKind::Route => self.routes.as_mut(),
            FragmentKind::Receiver => self.receivers.as_mut(),
            FragmentKind::InhibitRule => self.inhibit_rules.as_mut(),
            FragmentKind::BaseConfig => self.base_config.as_mut(),
        }
    }

    /// Backlog for a kind; base-config fragments have none.
    pub fn backlog(&self, kind: FragmentKind) -> Option<&dyn FragmentStore> {
        match kind {
            FragmentKind::Route => Some(self.backup_routes.as_ref()),
            FragmentKind::Receiver => Some(self.backup_receivers.as_ref()),
            FragmentKind::InhibitRule => Some(self.backup_inhibit_rules.as_ref()),
            FragmentKind::BaseConfig => None,
        }
    }

    pub(crate) fn backlog_mut(&mut self, kind: FragmentKind) -> Option<&mut dyn FragmentStore> {
        match kind {
            FragmentKind::Route => Some(self.backup_routes.as_mut()),
            FragmentKind::Receiver => Some(self.backup_receivers.as_mut()),
            FragmentKind::InhibitRule => Some(self.backup_inhibit_rules.as_mut()),
            FragmentKind::BaseConfig => None,
        }
    }

    /// Persist a fragment into its active store.
    ///
    /// Route payloads get `continue: true` injected before they are written.
    pub fn write_active(&mut self, fragment: &Fragment) -> StoreResult<()> {
        tracing::info!(
            kind = %fragment.kind,
            namespace = %fragment.namespace,
            name = %fragment.name,
            data_key = %fragment.data_key,
            "Creating fragment"
        );
        let file_name = fragment.file_name();
        self.write_payload(fragment.kind, &file_name, &fragment.payload)
            .inspect_err(|e| {
                tracing::error!(
                    kind = %fragment.kind,
                    namespace = %fragment.namespace,
                    name = %fragment.name,
                    data_key = %fragment.data_key,
                    error = %e,
                    "Failed to create fragment"
                );
            })
    }

    /// Write a payload into an active store by file name.
    pub(crate) fn write_payload(
        &mut self,
        kind: FragmentKind,
        file_name: &str,
        payload: &str,
    ) -> StoreResult<()> {
        let payload = prepare(kind, payload);
        self.active_mut(kind).write(file_name, &payload)
    }

    pub(crate) fn delete_payload(
        &mut self,
        kind: FragmentKind,
        file_name: &str,
    ) -> StoreResult<bool> {
        self.active_mut(kind).delete(file_name)
    }

    #[cfg(test)]
    pub(crate) fn replace_active(&mut self, kind: FragmentKind, store: Box<dyn FragmentStore>) {
        match kind {
            FragmentKind::Route => self.routes = store,
            FragmentKind::Receiver => self.receivers = store,
            FragmentKind::InhibitRule => self.inhibit_rules = store,
            FragmentKind::BaseConfig => self.base_config = store,
        }
    }

    /// Remove a fragment from its active store.
    pub fn delete_active(&mut self, fragment: &Fragment) -> StoreResult<()> {
        tracing::info!(
            kind = %fragment.kind,
            namespace = %fragment.namespace,
            name = %fragment.name,
            data_key = %fragment.data_key,
            "Deleting fragment"
        );
        self.active_mut(fragment.kind)
            .delete(&fragment.file_name())
            .map(|_| ())
            .inspect_err(|e| {
                tracing::error!(
                    kind = %fragment.kind,
                    file = %fragment.file_name(),
                    error = %e,
                    "Failed to delete fragment"
                );
            })
    }
}

/// Apply kind-specific rewrites before a payload is stored.
pub(crate) fn prepare(kind: FragmentKind, payload: &str) -> String {
    match kind {
        FragmentKind::Route => ensure_continue(payload),
        _ => payload.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Bundle;

    fn route(key: &str, payload: &str) -> Fragment {
        let bundle = Bundle::new("ns", "team").with_data(key, payload);
        Fragment::from_bundle(&bundle, FragmentKind::Route).remove(0)
    }

    #[test]
    fn test_write_active_transforms_routes() {
        let mut stores = StoreSet::in_memory();
        stores
            .write_active(&route("r1", "- receiver: x\n"))
            .unwrap();

        let stored = stores
            .active(FragmentKind::Route)
            .read("ns-team-r1")
            .unwrap()
            .unwrap();
        assert!(stored.contains("continue: true"));
    }

    #[test]
    fn test_delete_active_is_idempotent() {
        let mut stores = StoreSet::in_memory();
        let fragment = route("r1", "- receiver: x\n");
        stores.write_active(&fragment).unwrap();
        stores.delete_active(&fragment).unwrap();
        stores.delete_active(&fragment).unwrap();
        assert!(stores.active(FragmentKind::Route).is_empty().unwrap());
    }

    #[test]
    fn test_base_config_has_no_backlog() {
        let stores = StoreSet::in_memory();
        assert!(stores.backlog(FragmentKind::BaseConfig).is_none());
        assert!(stores.backlog(FragmentKind::Receiver).is_some());
    }
}
