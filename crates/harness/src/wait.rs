//! Bounded polling
//!
//! Waits are written as explicit loops around a [`Poller`]:
//!
//! ```ignore
//! let mut poller = Poller::new(timeout, interval);
//! loop {
//!     if condition(page).await? {
//!         break;
//!     }
//!     if !poller.tick().await {
//!         return Err(timeout_error);
//!     }
//! }
//! ```
//!
//! The condition is always checked at least once, even with a zero timeout.

use std::time::Duration;

use tokio::time::{sleep, Instant};

/// Default interval between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct Poller {
    started: Instant,
    deadline: Instant,
    interval: Duration,
    attempts: u32,
}

impl Poller {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: started + timeout,
            interval,
            attempts: 0,
        }
    }

    /// Record a failed attempt and sleep until the next one.
    ///
    /// Returns `false` without sleeping once the deadline has passed.
    pub async fn tick(&mut self) -> bool {
        self.attempts += 1;
        let now = Instant::now();
        if now >= self.deadline {
            return false;
        }
        sleep(self.interval.min(self.deadline - now)).await;
        true
    }

    /// Failed attempts so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ticks_until_deadline() {
        let mut poller = Poller::new(Duration::from_millis(30), Duration::from_millis(5));
        let mut ticks = 0;
        while poller.tick().await {
            ticks += 1;
            assert!(ticks < 1000, "poller never expired");
        }
        assert!(ticks >= 2);
        assert_eq!(poller.attempts(), ticks + 1);
        assert!(poller.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_zero_timeout_expires_immediately() {
        let mut poller = Poller::new(Duration::ZERO, Duration::from_millis(5));
        assert!(!poller.tick().await);
        assert_eq!(poller.remaining(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_sleep_is_capped_by_remaining_time() {
        let mut poller = Poller::new(Duration::from_millis(20), Duration::from_secs(60));
        let start = Instant::now();
        assert!(poller.tick().await);
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(!poller.tick().await);
    }
}
