//! Create/Update/Delete state machine for bundles.
//!
//! # Data Flow
//! ```text
//! BundleEvent
//!     → classify (out of scope: skipped)
//!     → write / delete active fragments
//!     → backlog::check_all
//!     → Assembler::build
//!         → ok: reload
//!         → rejected on create/update: quarantine, remove from active
//! ```
//!
//! # Design Decisions
//! - Events are processed one at a time; nothing here locks
//! - No failure escapes as an error; every event yields a `ReconcileOutcome`
//! - Deleting a base-config bundle leaves the template in place

use crate::assembler::Assembler;
use crate::backlog::{self, Promotion};
use crate::config::InstanceIdentity;
use crate::fragment::{classify, Bundle, Fragment, FragmentKind};
use crate::observability::metrics;
use crate::reload::{Reload, ReloadError};
use crate::source::BundleEvent;
use crate::store::StoreSet;

/// What a single event did to the controller's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The bundle is not addressed to this instance.
    Skipped,
    /// An update that changed nothing.
    Unchanged,
    /// The configuration was rebuilt and written.
    Applied {
        promoted: Vec<Promotion>,
        reloaded: bool,
    },
    /// The configuration was not written; `quarantined` lists the fragments
    /// moved to the backlog.
    Rejected {
        reason: String,
        quarantined: Vec<String>,
    },
}

impl ReconcileOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Applies bundle events to the stores of one controller instance.
#[derive(Debug)]
pub struct Reconciler<R> {
    identity: InstanceIdentity,
    stores: StoreSet,
    assembler: Assembler,
    reloader: R,
}

impl<R: Reload> Reconciler<R> {
    pub fn new(
        identity: InstanceIdentity,
        stores: StoreSet,
        assembler: Assembler,
        reloader: R,
    ) -> Self {
        Self {
            identity,
            stores,
            assembler,
            reloader,
        }
    }

    pub fn stores(&self) -> &StoreSet {
        &self.stores
    }

    pub fn reloader(&self) -> &R {
        &self.reloader
    }

    /// Dispatch one event from the bundle source.
    pub async fn handle(&mut self, event: &BundleEvent) -> ReconcileOutcome {
        match event {
            BundleEvent::Create(bundle) => self.create(bundle).await,
            BundleEvent::Update(old, new) => self.update(old, new).await,
            BundleEvent::Delete(bundle) => self.delete(bundle).await,
        }
    }

    /// Handle a newly observed bundle.
    pub async fn create(&mut self, bundle: &Bundle) -> ReconcileOutcome {
        let Some(kind) = self.scoped_kind(bundle) else {
            return ReconcileOutcome::Skipped;
        };

        let fragments = Fragment::from_bundle(bundle, kind);
        self.write_all(&fragments);
        self.settle(&fragments, true).await
    }

    /// Handle a changed bundle.
    pub async fn update(&mut self, old: &Bundle, new: &Bundle) -> ReconcileOutcome {
        let old_intent = classify(old, &self.identity);
        let new_intent = classify(new, &self.identity);
        if old_intent.instance_id == new_intent.instance_id && old.same_content(new) {
            tracing::debug!(
                namespace = %new.namespace,
                name = %new.name,
                "Bundle unchanged, nothing to do"
            );
            return ReconcileOutcome::Unchanged;
        }

        let old_kind = old_intent.scoped_kind(&self.identity);
        let new_kind = new_intent.scoped_kind(&self.identity);
        if old_kind.is_none() && new_kind.is_none() {
            self.log_skip(new);
            return ReconcileOutcome::Skipped;
        }

        if let Some(kind) = old_kind.filter(|k| k.is_structural()) {
            self.remove_all(&Fragment::from_bundle(old, kind));
        }

        let fragments = match new_kind {
            Some(kind) => {
                let fragments = Fragment::from_bundle(new, kind);
                self.write_all(&fragments);
                fragments
            }
            None => Vec::new(),
        };
        self.settle(&fragments, true).await
    }

    /// Handle a removed bundle.
    pub async fn delete(&mut self, bundle: &Bundle) -> ReconcileOutcome {
        let Some(kind) = self.scoped_kind(bundle) else {
            return ReconcileOutcome::Skipped;
        };
        if !kind.is_structural() {
            tracing::info!(
                namespace = %bundle.namespace,
                name = %bundle.name,
                "Keeping base configuration of deleted bundle"
            );
            return ReconcileOutcome::Skipped;
        }

        self.remove_all(&Fragment::from_bundle(bundle, kind));
        self.settle(&[], false).await
    }

    fn scoped_kind(&self, bundle: &Bundle) -> Option<FragmentKind> {
        let kind = classify(bundle, &self.identity).scoped_kind(&self.identity);
        if kind.is_none() {
            self.log_skip(bundle);
        }
        kind
    }

    fn log_skip(&self, bundle: &Bundle) {
        tracing::debug!(
            namespace = %bundle.namespace,
            name = %bundle.name,
            instance = self.identity.id,
            "Bundle not addressed to this instance, skipping"
        );
    }

    /// Write fragments to their active stores, taking any backlog copy out first.
    ///
    /// The build works from whatever landed.
    fn write_all(&mut self, fragments: &[Fragment]) {
        for fragment in fragments {
            if self.discard_backlog(fragment) && self.stores.write_active(fragment).is_err() {
                tracing::warn!(file = %fragment.file_name(), "Fragment left out of this build");
            }
        }
    }

    fn remove_all(&mut self, fragments: &[Fragment]) {
        for fragment in fragments {
            if self.stores.delete_active(fragment).is_err() {
                tracing::warn!(file = %fragment.file_name(), "Fragment still active after delete");
            }
            self.discard_backlog(fragment);
        }
    }

    /// Returns false when a backlog copy could not be removed.
    fn discard_backlog(&mut self, fragment: &Fragment) -> bool {
        match backlog::discard(&mut self.stores, fragment) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    file = %fragment.file_name(),
                    error = %e,
                    "Failed to remove fragment from backlog"
                );
                false
            }
        }
    }

    /// Promote what the backlog allows, rebuild, then reload or quarantine.
    async fn settle(&mut self, written: &[Fragment], count_failure: bool) -> ReconcileOutcome {
        let promoted = backlog::check_all(&mut self.stores, &self.assembler);

        if let Err(e) = self.assembler.build(&self.stores) {
            let reason = e.to_string();
            if !count_failure {
                tracing::error!(error = %reason, "Configuration rejected after delete");
                return ReconcileOutcome::Rejected {
                    reason,
                    quarantined: Vec::new(),
                };
            }

            metrics::record_config_error();
            let quarantined = self.quarantine_all(written);
            return ReconcileOutcome::Rejected {
                reason,
                quarantined,
            };
        }

        let reloaded = self.reload().await;
        ReconcileOutcome::Applied { promoted, reloaded }
    }

    fn quarantine_all(&mut self, fragments: &[Fragment]) -> Vec<String> {
        let mut quarantined = Vec::new();
        for fragment in fragments.iter().filter(|f| f.kind.is_structural()) {
            if let Err(e) = backlog::quarantine(&mut self.stores, fragment) {
                tracing::error!(
                    file = %fragment.file_name(),
                    error = %e,
                    "Failed to quarantine fragment"
                );
                continue;
            }
            if self.stores.delete_active(fragment).is_err() {
                // keep the fragment in exactly one place
                self.discard_backlog(fragment);
                continue;
            }
            quarantined.push(fragment.file_name());
        }
        quarantined
    }

    async fn reload(&self) -> bool {
        match self.reloader.reload().await {
            Ok(()) => {
                tracing::info!("Alertmanager reloaded");
                metrics::record_reload("success");
                true
            }
            Err(ReloadError::Cancelled) => {
                tracing::warn!("Reload abandoned on shutdown");
                metrics::record_reload("cancelled");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload Alertmanager");
                metrics::record_reload("failure");
                false
            }
        }
    }
}
