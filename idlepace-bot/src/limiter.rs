use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{Instant, sleep_until};

/// One permit per key every ten seconds.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(10_000);

#[derive(Debug, Default)]
struct PermitSlot {
    last_grant: Option<Instant>,
}

/// Process-wide spacing of permits per resource key (an endpoint host).
///
/// Each key owns a fair async lock around its last grant time. Waiters queue
/// on that lock in arrival order and the holder sleeps out the remaining
/// interval before granting, so queued delays add up instead of racing.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    slots: Mutex<HashMap<String, Arc<AsyncMutex<PermitSlot>>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            slots: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    fn slot(&self, key: &str) -> Arc<AsyncMutex<PermitSlot>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.to_string()).or_default())
    }

    /// Wait until a permit for `key` may be issued, then record the grant.
    pub async fn acquire(&self, key: &str) {
        let slot = self.slot(key);
        let mut slot = slot.lock().await;
        if let Some(last_grant) = slot.last_grant {
            let ready_at = last_grant + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(
                    "[{key}] Next request delayed by {} ms",
                    (ready_at - now).as_millis()
                );
                sleep_until(ready_at).await;
            }
        }
        slot.last_grant = Some(Instant::now());
    }
}
