//! Metrics collection and exposition.
//!
//! # Metrics
//! - `alertmanager_controller_config_errors_total` (counter): failed builds on create/update
//! - `alertmanager_controller_fragments_quarantined_total` (counter): by kind
//! - `alertmanager_controller_fragments_promoted_total` (counter): by kind
//! - `alertmanager_controller_reloads_total` (counter): by outcome

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

use crate::fragment::FragmentKind;

pub const CONFIG_ERRORS_TOTAL: &str = "alertmanager_controller_config_errors_total";
pub const FRAGMENTS_QUARANTINED_TOTAL: &str = "alertmanager_controller_fragments_quarantined_total";
pub const FRAGMENTS_PROMOTED_TOTAL: &str = "alertmanager_controller_fragments_promoted_total";
pub const RELOADS_TOTAL: &str = "alertmanager_controller_reloads_total";

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    ::metrics::describe_counter!(
        CONFIG_ERRORS_TOTAL,
        "Failed configuration builds on create and update"
    );
    ::metrics::describe_counter!(FRAGMENTS_QUARANTINED_TOTAL, "Fragments moved into a backlog");
    ::metrics::describe_counter!(FRAGMENTS_PROMOTED_TOTAL, "Fragments promoted out of a backlog");
    ::metrics::describe_counter!(RELOADS_TOTAL, "Alertmanager reload attempts by outcome");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_config_error() {
    ::metrics::counter!(CONFIG_ERRORS_TOTAL).increment(1);
}

pub fn record_quarantined(kind: FragmentKind) {
    ::metrics::counter!(FRAGMENTS_QUARANTINED_TOTAL, "kind" => kind.label()).increment(1);
}

pub fn record_promoted(kind: FragmentKind) {
    ::metrics::counter!(FRAGMENTS_PROMOTED_TOTAL, "kind" => kind.label()).increment(1);
}

pub fn record_reload(outcome: &'static str) {
    ::metrics::counter!(RELOADS_TOTAL, "outcome" => outcome).increment(1);
}
