//! # Poll Policy
//!
//! The retry/deadline decision of a polling check, separated from any clock.
//!
//! A polling check probes, and on failure asks the policy what to do next
//! given the time elapsed since the check began:
//!
//! ```text
//! probe ──ok──▶ done
//!   │
//!   fail
//!   ▼
//! elapsed >= timeout ? ──yes──▶ TimedOut
//!   │ no
//!   ▼
//! sleep min(interval, timeout - elapsed) ──▶ probe
//! ```
//!
//! The final delay is clipped to the deadline so a check that never succeeds
//! makes one last attempt exactly at the timeout and then gives up, rather
//! than overshooting by up to one interval.

use crate::plan::Timing;
use std::time::Duration;

/// What a polling check does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// Sleep for the given delay, then probe again.
    Retry(Duration),
    /// The global timeout is spent.
    TimedOut,
}

/// Fixed-interval retry policy with a per-check deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    poll_interval: Duration,
    timeout: Duration,
}

impl PollPolicy {
    /// Create a policy.
    #[must_use]
    pub const fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }

    /// Build the policy of a plan's timing section.
    #[must_use]
    pub const fn from_timing(timing: &Timing) -> Self {
        Self::new(
            Duration::from_millis(timing.poll_interval_ms),
            Duration::from_millis(timing.timeout_ms),
        )
    }

    /// Delay between attempts.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Budget of one polling check.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Decide the next step after a failed attempt.
    #[must_use]
    pub fn after_failure(&self, elapsed: Duration) -> PollDecision {
        if elapsed >= self.timeout {
            return PollDecision::TimedOut;
        }
        let remaining = self.timeout.saturating_sub(elapsed);
        PollDecision::Retry(self.poll_interval.min(remaining))
    }

    /// Attempts made by a check whose probe fails instantly every time.
    ///
    /// Returns `None` for a zero interval, which never terminates by count.
    #[must_use]
    pub fn attempts_until_timeout(&self) -> Option<u64> {
        let interval = self.poll_interval.as_millis();
        if interval == 0 {
            return None;
        }
        let retries = self.timeout.as_millis().div_ceil(interval);
        u64::try_from(retries).ok().map(|r| r.saturating_add(1))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_timing(&Timing::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn retries_on_interval_before_deadline() {
        let policy = PollPolicy::new(ms(500), ms(120_000));
        assert_eq!(policy.after_failure(ms(0)), PollDecision::Retry(ms(500)));
        assert_eq!(policy.after_failure(ms(1000)), PollDecision::Retry(ms(500)));
    }

    #[test]
    fn last_delay_is_clipped_to_deadline() {
        let policy = PollPolicy::new(ms(500), ms(1200));
        assert_eq!(policy.after_failure(ms(1000)), PollDecision::Retry(ms(200)));
    }

    #[test]
    fn times_out_at_deadline() {
        let policy = PollPolicy::new(ms(500), ms(1200));
        assert_eq!(policy.after_failure(ms(1200)), PollDecision::TimedOut);
        assert_eq!(policy.after_failure(ms(5000)), PollDecision::TimedOut);
    }

    #[test]
    fn zero_timeout_allows_single_attempt() {
        let policy = PollPolicy::new(ms(500), ms(0));
        assert_eq!(policy.after_failure(ms(0)), PollDecision::TimedOut);
        assert_eq!(policy.attempts_until_timeout(), Some(1));
    }

    #[test]
    fn default_policy_matches_defaults() {
        let policy = PollPolicy::default();
        assert_eq!(policy.poll_interval(), ms(500));
        assert_eq!(policy.timeout(), ms(120_000));
        assert_eq!(policy.attempts_until_timeout(), Some(241));
    }

    #[test]
    fn zero_interval_has_no_attempt_bound() {
        let policy = PollPolicy::new(ms(0), ms(1000));
        assert_eq!(policy.attempts_until_timeout(), None);
    }
}
