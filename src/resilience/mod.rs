//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to the downstream service:
//!     → retries.rs (retry with a fixed delay while the error is retryable)
//!     → ShutdownSignal (abort the wait between attempts)
//! ```
//!
//! # Design Decisions
//! - Retry classification belongs to the caller; the loop only waits
//! - No attempt cap: the caller decides which errors are worth waiting out
//! - Waiting is cancellable, attempts in flight are not

pub mod retries;

pub use retries::{retry_fixed, RetryError};
