//! Configuration fragments and their classification.
//!
//! # Data Flow
//! ```text
//! Bundle (namespace, name, data, annotations)
//!     → intent.rs (annotations → FragmentIntent)
//!     → Fragment per data entry (identity + payload + kind)
//!     → store / backlog
//! ```
//!
//! # Design Decisions
//! - Classification is derived on every event, never stored
//! - A bundle setting more than one type flag is unclassified, not guessed
//! - Storage identity is `{namespace}-{name}-{dataKey}` for structural kinds
//!   and the bare data key for base-config fragments

pub mod bundle;
pub mod intent;

pub use bundle::Bundle;
pub use intent::{classify, FragmentIntent, InstanceIdentity};

use std::fmt;

/// The kind of configuration a fragment contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FragmentKind {
    Route,
    Receiver,
    InhibitRule,
    BaseConfig,
}

impl FragmentKind {
    /// Kinds that are assembled from many fragments and can be quarantined.
    ///
    /// The order is the fixed order in which backlogs are checked.
    pub const STRUCTURAL: [FragmentKind; 3] = [
        FragmentKind::InhibitRule,
        FragmentKind::Route,
        FragmentKind::Receiver,
    ];

    /// Returns true for kinds that have an active store and a backlog.
    pub fn is_structural(self) -> bool {
        !matches!(self, FragmentKind::BaseConfig)
    }

    /// Human readable label used in log events and metric labels.
    pub fn label(self) -> &'static str {
        match self {
            FragmentKind::Route => "route",
            FragmentKind::Receiver => "receiver",
            FragmentKind::InhibitRule => "inhibit_rule",
            FragmentKind::BaseConfig => "config",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One data entry of a bundle, typed by the bundle's intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub namespace: String,
    pub name: String,
    pub data_key: String,
    pub payload: String,
    pub kind: FragmentKind,
}

impl Fragment {
    /// File name used by the stores for this fragment.
    pub fn file_name(&self) -> String {
        match self.kind {
            FragmentKind::BaseConfig => self.data_key.clone(),
            _ => format!("{}-{}-{}", self.namespace, self.name, self.data_key),
        }
    }

    /// Split a bundle into one fragment per data entry.
    ///
    /// Entries come out in data-key order.
    pub fn from_bundle(bundle: &Bundle, kind: FragmentKind) -> Vec<Fragment> {
        bundle
            .data
            .iter()
            .map(|(key, payload)| Fragment {
                namespace: bundle.namespace.clone(),
                name: bundle.name.clone(),
                data_key: key.clone(),
                payload: payload.clone(),
                kind,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> Bundle {
        let mut bundle = Bundle::new("monitoring", "team-a");
        bundle.data.insert("r2".into(), "- receiver: b".into());
        bundle.data.insert("r1".into(), "- receiver: a".into());
        bundle
    }

    #[test]
    fn test_structural_file_name() {
        let fragments = Fragment::from_bundle(&bundle(), FragmentKind::Route);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].file_name(), "monitoring-team-a-r1");
        assert_eq!(fragments[1].file_name(), "monitoring-team-a-r2");
    }

    #[test]
    fn test_base_config_uses_bare_key() {
        let fragments = Fragment::from_bundle(&bundle(), FragmentKind::BaseConfig);
        assert_eq!(fragments[0].file_name(), "r1");
    }

    #[test]
    fn test_backlog_check_order() {
        assert_eq!(
            FragmentKind::STRUCTURAL,
            [FragmentKind::InhibitRule, FragmentKind::Route, FragmentKind::Receiver]
        );
        assert!(!FragmentKind::BaseConfig.is_structural());
    }
}
