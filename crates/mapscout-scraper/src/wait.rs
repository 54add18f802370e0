//! Bounded, cancellable waits.
//!
//! Every suspension point in a collection run goes through here so that a
//! stalled page can never hang a run and a cancelled run stops at the next
//! await.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::driver::millis;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WaitError {
    #[error("condition not met within {timeout_ms}ms")]
    TimedOut { timeout_ms: u64 },

    #[error("wait cancelled")]
    Cancelled,
}

/// How long to wait for a condition and how often to re-check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitCondition {
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitCondition {
    #[must_use]
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

/// Re-runs `probe` until it yields `Some`, the timeout elapses, or `cancel`
/// fires. The probe always runs at least once, so a zero timeout means
/// "check exactly once".
///
/// # Errors
///
/// [`WaitError::TimedOut`] when the deadline passes without a value,
/// [`WaitError::Cancelled`] when the token fires first.
pub async fn poll_until<T, F, Fut>(
    condition: WaitCondition,
    cancel: &CancellationToken,
    mut probe: F,
) -> Result<T, WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + condition.timeout;

    loop {
        let attempt = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(WaitError::Cancelled),
            value = probe() => value,
        };
        if let Some(value) = attempt {
            return Ok(value);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(WaitError::TimedOut {
                timeout_ms: millis(condition.timeout),
            });
        }

        let nap = condition.interval.min(deadline - now);
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(WaitError::Cancelled),
            () = tokio::time::sleep(nap) => {}
        }
    }
}

/// Sleeps for `delay` unless cancelled. Returns `false` if the token fired.
pub async fn settle(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}

/// Runs `fut` to completion unless `cancel` fires first.
pub async fn or_cancel<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}
