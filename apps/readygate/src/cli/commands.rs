//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::gate::Gate;
use crate::handoff::{HandoffMode, ProcessLauncher};
use crate::probe::SystemProber;
use readygate_core::{CheckMode, GateError, GatePlan, GateReport};

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Wait for the plan's preconditions, then hand off to its successor.
///
/// Only returns on failure, or with the successor's status in spawn mode.
pub async fn cmd_run(plan: &GatePlan, handoff: HandoffMode) -> Result<i32, GateError> {
    let gate = Gate::new(SystemProber::new(plan.timing.attempt_timeout())?);
    let mut launcher = ProcessLauncher::new(handoff);
    gate.run_and_hand_off(plan, &mut launcher).await
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Wait for the plan's preconditions and print a report.
pub async fn cmd_check(plan: &GatePlan, json_mode: bool) -> Result<(), GateError> {
    let gate = Gate::new(SystemProber::new(plan.timing.attempt_timeout())?);
    let report = gate.run(plan).await?;

    if json_mode {
        println!("{}", to_json(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &GateReport) {
    println!("Preconditions:");
    for check in &report.checks {
        let mode = match check.mode {
            CheckMode::Static => "static",
            CheckMode::Polling => "polling",
        };
        println!(
            "  OK  {:<40} {:<8} {:>4} attempt(s) {:>8} ms",
            check.label, mode, check.attempts, check.elapsed_ms
        );
    }
    println!();
    println!("Initial delay: {} ms", report.initial_delay_ms);
    println!("Total:         {} ms", report.total_elapsed_ms);
}

// =============================================================================
// PLAN COMMAND
// =============================================================================

/// Print the resolved plan.
pub fn cmd_plan(plan: &GatePlan, json_mode: bool) -> Result<(), GateError> {
    if json_mode {
        println!("{}", to_json(plan)?);
    } else {
        print!("{}", plan.to_toml_string()?);
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, GateError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| GateError::InvalidConfig(format!("cannot render JSON: {e}")))
}
