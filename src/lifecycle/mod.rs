//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Signal received → trigger → watcher stops, pending reload retries abort
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Cancellation is a level (watch channel), not an event, so late
//!   subscribers still observe it
//! - The event in progress finishes its file work; only waits are cut short

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
