//! Fixed-interval retry loop.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::lifecycle::ShutdownSignal;

/// Why a retried operation gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The operation failed with an error that is not retried.
    Failed(E),
    /// Shutdown was triggered while waiting for the next attempt.
    Cancelled,
}

/// Run `op` until it succeeds or fails with an error `retryable` rejects.
///
/// Waits `interval` between attempts and never gives up on its own.
pub async fn retry_fixed<T, E, Op, Fut, R>(
    interval: Duration,
    signal: &mut ShutdownSignal,
    mut retryable: R,
    mut op: Op,
) -> Result<T, RetryError<E>>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: FnMut(&E) -> bool,
    E: Display,
{
    let mut attempt: u64 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if retryable(&e) => {
                tracing::warn!(
                    attempt,
                    retry_in_secs = interval.as_secs_f64(),
                    error = %e,
                    "Downstream not ready, waiting before retrying"
                );
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = signal.triggered() => return Err(RetryError::Cancelled),
                }
                attempt += 1;
            }
            Err(e) => return Err(RetryError::Failed(e)),
        }
    }
}
