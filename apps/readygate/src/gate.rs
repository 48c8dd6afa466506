//! # Readiness Gate
//!
//! Runs the preconditions of a [`GatePlan`] strictly in order and stops at
//! the first one that fails for good.
//!
//! ```text
//! static check ──fail──▶ GateError (no retry, no delay)
//!      │ ok
//!      ▼
//! [initial delay, once, before the first polling check]
//!      ▼
//! polling check ──timeout──▶ GateError
//!      │ ok
//!      ▼
//!     ...  ──▶ GateReport ──▶ handoff
//! ```
//!
//! Each attempt is bounded by the plan's attempt timeout, whatever the probe
//! kind. At most one attempt is in flight at any time.

use crate::handoff::Launcher;
use crate::probe::Prober;
use readygate_core::{
    CheckMode, CheckReport, GateError, GatePlan, GateReport, PollDecision, PollPolicy,
    Precondition, ProbeOutcome,
};
use std::time::Duration;
use tokio::time::Instant;

/// Sequential precondition runner.
pub struct Gate<P> {
    prober: P,
}

impl<P: Prober> Gate<P> {
    /// Create a gate that probes through `prober`.
    pub fn new(prober: P) -> Self {
        Self { prober }
    }

    /// Access the prober.
    pub fn prober(&self) -> &P {
        &self.prober
    }

    /// Evaluate every precondition of the plan.
    ///
    /// Returns on the first failure; later preconditions are never probed.
    pub async fn run(&self, plan: &GatePlan) -> Result<GateReport, GateError> {
        plan.validate()?;

        let started = Instant::now();
        let policy = plan.timing.policy();
        let attempt_timeout = plan.timing.attempt_timeout();
        let mut report = GateReport::new();
        let mut delay_pending = true;

        for check in &plan.preconditions {
            let passed = match check.mode() {
                CheckMode::Static => self.check_once(check, attempt_timeout).await,
                CheckMode::Polling => {
                    if delay_pending {
                        delay_pending = false;
                        report.initial_delay_ms = initial_delay(plan.timing.initial_delay()).await;
                    }
                    self.poll(check, &policy, attempt_timeout).await
                }
            }?;
            report.record(passed);
        }

        report.total_elapsed_ms = elapsed_ms(started);
        tracing::info!(
            checks = report.checks.len(),
            attempts = report.total_attempts(),
            elapsed_ms = report.total_elapsed_ms,
            "All preconditions satisfied"
        );
        Ok(report)
    }

    /// Run the gate, then hand off to the plan's successor exactly once.
    ///
    /// A plan without a successor is rejected before anything is probed.
    /// Returns the successor's exit status when the launcher waits for it.
    pub async fn run_and_hand_off<L: Launcher>(
        &self,
        plan: &GatePlan,
        launcher: &mut L,
    ) -> Result<i32, GateError> {
        let successor = plan.successor.as_ref().ok_or_else(|| {
            GateError::InvalidConfig(
                "no successor: pass a command after `--` or set [successor] in the plan"
                    .to_string(),
            )
        })?;

        self.run(plan).await?;

        tracing::info!("Starting {}", successor.command_line());
        launcher.launch(successor).await
    }

    /// One attempt, bounded by the attempt timeout.
    async fn attempt(&self, check: &Precondition, attempt_timeout: Duration) -> ProbeOutcome {
        match tokio::time::timeout(attempt_timeout, self.prober.probe(check)).await {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::not_ready(format!(
                "attempt timed out after {} ms",
                attempt_timeout.as_millis()
            )),
        }
    }

    async fn check_once(
        &self,
        check: &Precondition,
        attempt_timeout: Duration,
    ) -> Result<CheckReport, GateError> {
        tracing::info!("{}", check.waiting_message());
        let started = Instant::now();
        match self.attempt(check, attempt_timeout).await {
            ProbeOutcome::Ready => Ok(CheckReport {
                label: check.label(),
                mode: CheckMode::Static,
                attempts: 1,
                elapsed_ms: elapsed_ms(started),
            }),
            ProbeOutcome::NotReady(reason) => {
                tracing::debug!(check = %check, %reason, "static check failed");
                Err(check.failure(1, elapsed_ms(started)))
            }
        }
    }

    async fn poll(
        &self,
        check: &Precondition,
        policy: &PollPolicy,
        attempt_timeout: Duration,
    ) -> Result<CheckReport, GateError> {
        tracing::info!("{}", check.waiting_message());
        tracing::debug!(
            check = %check,
            max_attempts = ?policy.attempts_until_timeout(),
            "polling"
        );
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            match self.attempt(check, attempt_timeout).await {
                ProbeOutcome::Ready => {
                    match check.ready_message() {
                        Some(message) => {
                            tracing::info!(check = %check, attempts, "{message}");
                        }
                        None => tracing::debug!(check = %check, attempts, "ready"),
                    }
                    return Ok(CheckReport {
                        label: check.label(),
                        mode: CheckMode::Polling,
                        attempts,
                        elapsed_ms: elapsed_ms(started),
                    });
                }
                ProbeOutcome::NotReady(reason) => {
                    tracing::debug!(check = %check, attempt = attempts, %reason, "not ready");
                    match policy.after_failure(started.elapsed()) {
                        PollDecision::Retry(delay) => tokio::time::sleep(delay).await,
                        PollDecision::TimedOut => {
                            return Err(check.failure(attempts, elapsed_ms(started)));
                        }
                    }
                }
            }
        }
    }
}

/// Sleep for the initial delay, returning the milliseconds spent.
async fn initial_delay(delay: Duration) -> u64 {
    if delay.is_zero() {
        return 0;
    }
    tracing::info!("Waiting {} ms before polling...", delay.as_millis());
    let started = Instant::now();
    tokio::time::sleep(delay).await;
    elapsed_ms(started)
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
