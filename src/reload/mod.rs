//! Alertmanager reload subsystem.
//!
//! # Responsibilities
//! - POST to the reload endpoint after a configuration was written
//! - Wait out a downstream that is not accepting connections yet
//!
//! # Design Decisions
//! - Only "connection refused" is retried, every 8 seconds by default, with no cap
//! - Any other transport error and any non-200 answer is reported once
//! - The wait between attempts is cut short by shutdown

pub mod client;

pub use client::{Reload, ReloadClient, ReloadError};
