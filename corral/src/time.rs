//! Bounded waits.
//!
//! Every wait in the library (lock acquisition, platform polling) is bounded
//! by an explicit [`Deadline`] and paced by an exponential [`Backoff`].

use std::time::{Duration, Instant};

/// Stand-in horizon for timeouts too large to add to the clock.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// A point in time after which a wait gives up.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires: Instant,
}

impl Deadline {
    /// A deadline `timeout` from now.
    ///
    /// Timeouts beyond the clock's range are clamped to a far-future deadline.
    pub fn after(timeout: Duration) -> Self {
        let now = Instant::now();
        let expires = now
            .checked_add(timeout)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self { expires }
    }

    /// True once the deadline has passed.
    pub fn expired(&self) -> bool {
        Instant::now() >= self.expires
    }

    /// Time left, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.expires.saturating_duration_since(Instant::now())
    }
}

/// Exponential backoff between attempts, doubling up to a ceiling.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            next: initial.min(max),
            max,
        }
    }

    /// The next delay. Each call doubles the following one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2).min(self.max);
        delay
    }

    /// Sleep for the next delay, cut short so the deadline is not overshot.
    ///
    /// Returns false without sleeping if the deadline has already passed.
    pub fn sleep_within(&mut self, deadline: &Deadline) -> bool {
        let remaining = deadline.remaining();
        if remaining.is_zero() {
            return false;
        }
        std::thread::sleep(self.next_delay().min(remaining));
        true
    }
}
