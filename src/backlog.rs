//! Quarantine backlog for rejected fragments.
//!
//! # Responsibilities
//! - Hold fragments whose inclusion made the assembled config invalid
//! - On every mutating event, try to promote one fragment per kind back into
//!   the active store if the assembly now validates with it
//!
//! # Design Decisions
//! - Kinds are checked in the fixed order inhibit rule, route, receiver
//! - At most one promotion per kind per call; a promotion does not re-run
//!   the other kinds. Convergence relies on later events, and a fragment can
//!   stay quarantined for as long as no further event arrives
//! - A fragment is never in the active store and the backlog at once

use crate::assembler::{AssembleError, AssembleResult, Assembler};
use crate::fragment::{Fragment, FragmentKind};
use crate::observability::metrics;
use crate::store::{prepare, StoreResult, StoreSet};

/// A fragment moved from a backlog into its active store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub kind: FragmentKind,
    pub file_name: String,
}

/// Place a rejected fragment into its kind's backlog.
///
/// Route payloads are transformed here so promotion can store them as is.
pub fn quarantine(stores: &mut StoreSet, fragment: &Fragment) -> StoreResult<()> {
    let Some(backlog) = stores.backlog_mut(fragment.kind) else {
        return Ok(());
    };
    tracing::debug!(
        kind = %fragment.kind,
        namespace = %fragment.namespace,
        name = %fragment.name,
        data_key = %fragment.data_key,
        "Quarantining fragment until the configuration accepts it"
    );
    backlog.write(&fragment.file_name(), &prepare(fragment.kind, &fragment.payload))?;
    metrics::record_quarantined(fragment.kind);
    Ok(())
}

/// Remove a fragment from its kind's backlog if present.
pub fn discard(stores: &mut StoreSet, fragment: &Fragment) -> StoreResult<bool> {
    match stores.backlog_mut(fragment.kind) {
        Some(backlog) => backlog.delete(&fragment.file_name()),
        None => Ok(false),
    }
}

/// Try one promotion for every non-empty backlog.
pub fn check_all(stores: &mut StoreSet, assembler: &Assembler) -> Vec<Promotion> {
    let mut promoted = Vec::new();
    for kind in FragmentKind::STRUCTURAL {
        let pending = match stores.backlog(kind).map(|b| b.is_empty()) {
            Some(Ok(empty)) => !empty,
            Some(Err(e)) => {
                tracing::error!(kind = %kind, error = %e, "Failed to read backlog");
                false
            }
            None => false,
        };
        if !pending {
            continue;
        }

        tracing::debug!(kind = %kind, "Checking backlog");
        match promote(stores, assembler, kind) {
            Ok(Some(promotion)) => promoted.push(promotion),
            Ok(None) => {}
            Err(e) => tracing::error!(kind = %kind, error = %e, "Backlog check failed"),
        }
    }
    promoted
}

/// Promote the first backlog entry of `kind` that yields a valid assembly.
pub fn promote(
    stores: &mut StoreSet,
    assembler: &Assembler,
    kind: FragmentKind,
) -> AssembleResult<Option<Promotion>> {
    let Some(backlog) = stores.backlog(kind) else {
        return Ok(None);
    };
    let entries = backlog.entries()?;
    let sections = assembler.sections(stores)?;

    for (file_name, payload) in entries {
        let mut candidate = sections.clone();
        let section = match kind {
            FragmentKind::Route => &mut candidate.routes,
            FragmentKind::Receiver => &mut candidate.receivers,
            FragmentKind::InhibitRule => &mut candidate.inhibit_rules,
            FragmentKind::BaseConfig => return Ok(None),
        };
        section.push_str(&payload);
        section.push('\n');

        match assembler.check(stores, &candidate) {
            Ok(_) => {
                move_to_active(stores, kind, &file_name, &payload)?;
                tracing::info!(kind = %kind, file = %file_name, "Promoted quarantined fragment");
                metrics::record_promoted(kind);
                return Ok(Some(Promotion { kind, file_name }));
            }
            Err(AssembleError::Invalid(reason)) => {
                tracing::debug!(
                    kind = %kind,
                    file = %file_name,
                    reason = %reason,
                    "Quarantined fragment still rejected"
                );
            }
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

fn move_to_active(
    stores: &mut StoreSet,
    kind: FragmentKind,
    file_name: &str,
    payload: &str,
) -> StoreResult<()> {
    stores.write_payload(kind, file_name, payload)?;
    let removed = match stores.backlog_mut(kind) {
        Some(backlog) => backlog.delete(file_name),
        None => Ok(true),
    };
    if let Err(e) = removed {
        // keep the fragment in exactly one place
        if let Err(rollback) = stores.delete_payload(kind, file_name) {
            tracing::error!(file = %file_name, error = %rollback, "Failed to roll back promotion");
        }
        return Err(e);
    }
    Ok(())
}
