//! Bundle classification.
//!
//! # Responsibilities
//! - Read the type flags, instance id and access key from annotations
//! - Coerce unparsable values to `false` / `0` instead of failing
//! - Decide whether a bundle belongs to this controller instance

use crate::fragment::{Bundle, FragmentKind};

// Re-export InstanceIdentity from config module to avoid duplication
pub use crate::config::schema::InstanceIdentity;

pub const ANNOTATION_ID: &str = "alertmanager.net/id";
pub const ANNOTATION_ROUTE: &str = "alertmanager.net/route";
pub const ANNOTATION_RECEIVER: &str = "alertmanager.net/receiver";
pub const ANNOTATION_INHIBIT_RULE: &str = "alertmanager.net/inhibit_rule";
pub const ANNOTATION_CONFIG: &str = "alertmanager.net/config";
pub const ANNOTATION_KEY: &str = "alertmanager.net/key";

/// What a bundle declares about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentIntent {
    /// `None` when zero or more than one type flag is set.
    pub kind: Option<FragmentKind>,
    /// Target instance id, `0` when absent or unparsable.
    pub instance_id: i64,
    /// Whether the bundle's access key equals the instance key.
    pub key_matches: bool,
}

impl FragmentIntent {
    /// True when the bundle declares no usable type.
    pub fn is_unclassified(&self) -> bool {
        self.kind.is_none()
    }

    /// True when the bundle must be processed by the given instance.
    pub fn in_scope(&self, identity: &InstanceIdentity) -> bool {
        if self.instance_id != identity.id {
            return false;
        }
        match self.kind {
            Some(FragmentKind::BaseConfig) => self.key_matches,
            Some(_) => true,
            None => false,
        }
    }

    /// The kind, if the bundle is in scope for the instance.
    pub fn scoped_kind(&self, identity: &InstanceIdentity) -> Option<FragmentKind> {
        if self.in_scope(identity) {
            self.kind
        } else {
            None
        }
    }
}

/// Classify a bundle against the controller's identity.
pub fn classify(bundle: &Bundle, identity: &InstanceIdentity) -> FragmentIntent {
    let flags = [
        (FragmentKind::Route, parse_flag(bundle.annotation(ANNOTATION_ROUTE))),
        (FragmentKind::Receiver, parse_flag(bundle.annotation(ANNOTATION_RECEIVER))),
        (FragmentKind::InhibitRule, parse_flag(bundle.annotation(ANNOTATION_INHIBIT_RULE))),
        (FragmentKind::BaseConfig, parse_flag(bundle.annotation(ANNOTATION_CONFIG))),
    ];

    let mut set = flags.iter().filter(|(_, on)| *on).map(|(kind, _)| *kind);
    let kind = match (set.next(), set.next()) {
        (Some(kind), None) => Some(kind),
        (Some(_), Some(_)) => {
            tracing::warn!(
                namespace = %bundle.namespace,
                name = %bundle.name,
                "Bundle declares more than one fragment type, ignoring it"
            );
            None
        }
        _ => None,
    };

    FragmentIntent {
        kind,
        instance_id: parse_id(bundle.annotation(ANNOTATION_ID)),
        key_matches: bundle.annotation(ANNOTATION_KEY).unwrap_or_default() == identity.key,
    }
}

/// Permissive boolean parsing with the usual true/false spellings.
fn parse_flag(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "t" | "T" | "true" | "TRUE" | "True"))
}

fn parse_id(value: Option<&str>) -> i64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0)
}
