//! Alertmanager configuration controller.
//!
//! Merges route, receiver and inhibit-rule fragments delivered as bundles
//! into one validated alertmanager.yml, quarantining fragments the
//! configuration rejects, and asks Alertmanager to reload.

// Core subsystems
pub mod assembler;
pub mod backlog;
pub mod fragment;
pub mod reconciler;
pub mod routing;
pub mod store;

// Edges
pub mod reload;
pub mod source;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::ControllerConfig;
pub use lifecycle::Shutdown;
pub use reconciler::{ReconcileOutcome, Reconciler};
