use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::time::Duration;

/// Wall-clock reading and timer suspension for the agent loops.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;

    async fn sleep(&self, duration: Duration);
}

/// Local system time backed by tokio timers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Convert fractional hours to a timer duration. Negative or non-finite input
/// is zero; values past `Duration::MAX` saturate.
#[must_use]
pub fn hours(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::try_from_secs_f64(value * 3600.0).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_fractional_hours() {
        assert_eq!(hours(0.5), Duration::from_secs(1800));
        assert_eq!(hours(30.0 / 3600.0), Duration::from_secs(30));
        assert_eq!(hours(-1.0), Duration::ZERO);
        assert_eq!(hours(f64::NAN), Duration::ZERO);
        assert_eq!(hours(f64::MAX), Duration::MAX);
    }
}
