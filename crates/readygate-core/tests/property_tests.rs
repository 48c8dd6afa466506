//! # Property-Based Tests
//!
//! Timing invariants of polling checks, driven through [`PollPolicy`] with a
//! simulated clock in which every probe attempt is instantaneous.

use proptest::prelude::*;
use readygate_core::{PollDecision, PollPolicy};
use std::time::Duration;

/// Outcome of a simulated polling check.
struct Simulated {
    attempts: u64,
    elapsed: Duration,
    succeeded: bool,
}

/// Run a polling check whose probe succeeds on attempt `succeed_on`
/// (never, if `None`).
fn simulate(policy: &PollPolicy, succeed_on: Option<u64>) -> Simulated {
    let mut elapsed = Duration::ZERO;
    let mut attempts = 0u64;
    loop {
        attempts += 1;
        if succeed_on == Some(attempts) {
            return Simulated {
                attempts,
                elapsed,
                succeeded: true,
            };
        }
        match policy.after_failure(elapsed) {
            PollDecision::Retry(delay) => elapsed += delay,
            PollDecision::TimedOut => {
                return Simulated {
                    attempts,
                    elapsed,
                    succeeded: false,
                };
            }
        }
    }
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// A probe that always fails gives up exactly at the global timeout.
    #[test]
    fn always_failing_probe_stops_at_timeout(
        interval in 1u64..2_000,
        timeout in 0u64..60_000,
    ) {
        let policy = PollPolicy::new(Duration::from_millis(interval), Duration::from_millis(timeout));
        let run = simulate(&policy, None);

        prop_assert!(!run.succeeded);
        prop_assert_eq!(run.elapsed, Duration::from_millis(timeout));
        prop_assert_eq!(Some(run.attempts), policy.attempts_until_timeout());
    }

    /// Success on attempt N costs (N-1) intervals when that fits in the budget.
    #[test]
    fn nth_attempt_success_costs_n_minus_one_intervals(
        interval in 1u64..2_000,
        n in 1u64..50,
    ) {
        let timeout = interval * 100;
        let policy = PollPolicy::new(Duration::from_millis(interval), Duration::from_millis(timeout));
        let run = simulate(&policy, Some(n));

        prop_assert!(run.succeeded);
        prop_assert_eq!(run.attempts, n);
        prop_assert_eq!(run.elapsed, Duration::from_millis((n - 1) * interval));
    }

    /// No retry delay ever exceeds the interval or crosses the deadline.
    #[test]
    fn retry_delay_is_bounded(
        interval in 1u64..5_000,
        timeout in 0u64..120_000,
        elapsed in 0u64..130_000,
    ) {
        let policy = PollPolicy::new(Duration::from_millis(interval), Duration::from_millis(timeout));
        match policy.after_failure(Duration::from_millis(elapsed)) {
            PollDecision::Retry(delay) => {
                prop_assert!(elapsed < timeout);
                prop_assert!(delay <= Duration::from_millis(interval));
                prop_assert!(elapsed + delay.as_millis() as u64 <= timeout);
                prop_assert!(!delay.is_zero());
            }
            PollDecision::TimedOut => prop_assert!(elapsed >= timeout),
        }
    }
}
