//! Bounded poll-until primitive.
//!
//! Dynamically rendered dashboards expose their numbers some time
//! after navigation finishes. Every wait for such content goes through
//! [`poll_until`]: re-evaluate an async condition at a fixed interval
//! until it produces a value or the deadline elapses.

use std::future::Future;
use std::time::Duration;

use crate::error::{ProbeError, Result};

/// Re-evaluates `condition` every `interval` until it returns
/// `Some(value)` or `deadline` elapses.
///
/// The condition is polled immediately, so an already-true condition
/// never sleeps. Condition errors propagate at once; deadline expiry
/// surfaces as [`ProbeError::Timeout`] naming `what`.
pub async fn poll_until<T, F, Fut>(
    mut condition: F,
    interval: Duration,
    deadline: Duration,
    what: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let attempts = async {
        loop {
            if let Some(value) = condition().await? {
                return Ok(value);
            }
            tokio::time::sleep(interval).await;
        }
    };

    match tokio::time::timeout(deadline, attempts).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ProbeError::timeout(deadline, what)),
    }
}
