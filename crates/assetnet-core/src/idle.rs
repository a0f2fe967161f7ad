//! Idle Waiter (spec §4.F).
//!
//! Blocks until a filtered view of the in-flight set has been empty
//! continuously for a quiet window, subject to a hard wall-clock ceiling.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::hard_idle_timeout;
use crate::error::NetworkError;
use crate::registry::RequestRegistry;
use crate::types::RequestRecord;

/// Poll cadence while waiting for the in-flight set to drain. Small relative
/// to the default 100ms quiet window so the quiet window is measured
/// accurately rather than rounded up to the next poll tick.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Block until `registry`'s records matching `filter` have been empty
/// continuously for `quiet_window`, or raise [`NetworkError::IdleTimeout`]
/// once the hard ceiling (spec §4.F / [`hard_idle_timeout`]) elapses first.
pub async fn wait_for_idle(
    registry: &RequestRegistry,
    filter: impl Fn(&RequestRecord) -> bool,
    quiet_window: Duration,
) -> Result<(), NetworkError> {
    wait_for_idle_with_ceiling(registry, filter, quiet_window, hard_idle_timeout()).await
}

/// [`wait_for_idle`] with the hard ceiling passed in explicitly rather than
/// read from [`hard_idle_timeout`]'s process-wide `OnceLock`, so the timeout
/// path is exercised by tests without depending on global, one-shot state.
pub(crate) async fn wait_for_idle_with_ceiling(
    registry: &RequestRegistry,
    filter: impl Fn(&RequestRecord) -> bool,
    quiet_window: Duration,
    hard_ceiling: Duration,
) -> Result<(), NetworkError> {
    let deadline = Instant::now() + hard_ceiling;
    let mut quiet_since: Option<Instant> = None;

    loop {
        let in_flight = registry.in_flight(&filter);

        if in_flight.is_empty() {
            let since = *quiet_since.get_or_insert_with(Instant::now);
            if since.elapsed() >= quiet_window {
                return Ok(());
            }
        } else {
            quiet_since = None;
        }

        if Instant::now() >= deadline {
            return Err(NetworkError::IdleTimeout {
                active: in_flight.into_iter().map(|r| r.url).collect(),
            });
        }

        let remaining_to_deadline = deadline.saturating_duration_since(Instant::now());
        tokio::time::sleep(POLL_INTERVAL.min(remaining_to_deadline)).await;
    }
}

#[cfg(test)]
mod tests;
