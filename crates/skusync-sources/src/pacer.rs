//! Request pacing and pagination safety
//!
//! [`RequestPacer`] enforces a minimum interval between requests by
//! sleeping, which is all the strict per-minute caps of the ERP APIs need:
//! adapters issue sequential requests, so a simple interval is equivalent
//! to a one-token bucket and much easier to reason about.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Hard ceiling on pages fetched in one enumeration
///
/// A source that keeps reporting "more pages" past this point is
/// misbehaving (or its total is growing faster than we read); enumeration
/// stops here with a warning instead of looping forever.
pub const MAX_PAGES: u32 = 10_000;

/// Sleep-based minimum-interval pacer
///
/// Shared via `Arc` when several call paths hit the same source. The
/// internal lock is held across the sleep so concurrent callers are
/// serialized rather than released in a burst.
#[derive(Debug)]
pub struct RequestPacer {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    /// Creates a pacer with the given minimum interval between requests
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Creates a pacer from a millisecond interval
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Waits until the minimum interval since the previous request has
    /// elapsed, then records now as the latest request time
    pub async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Pacing source request");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}
