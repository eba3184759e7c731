//! Route fragment rewriting.
//!
//! # Responsibilities
//! - Force `continue: true` on every dynamically injected route
//!
//! # Design Decisions
//! - Injected routes must not stop evaluation of routes merged after them,
//!   whatever order they end up in
//! - Best effort: malformed YAML is passed through unchanged and left for
//!   the validator to reject

pub mod continuation;

pub use continuation::ensure_continue;
