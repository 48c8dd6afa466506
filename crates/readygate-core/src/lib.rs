//! # readygate-core
//!
//! The pure half of readygate - THE LOGIC.
//!
//! A readiness gate blocks the launch of a dependent service until an ordered
//! list of preconditions holds, then hands control to that service. This crate
//! describes the gate without performing any I/O:
//!
//! - `types` → preconditions, probe outcomes, reports, `GateError`
//! - `poll` → the retry/deadline decision for polling checks
//! - `plan` → timing, successor and the TOML plan file
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Never sleeps; callers feed elapsed time into [`PollPolicy`]
//! - Every failure is a [`GateError`], and every `GateError` is terminal

// =============================================================================
// MODULES
// =============================================================================

pub mod plan;
pub mod poll;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{CheckMode, CheckReport, GateError, GateReport, Precondition, ProbeOutcome};

// =============================================================================
// RE-EXPORTS: Poll Policy
// =============================================================================

pub use poll::{PollDecision, PollPolicy};

// =============================================================================
// RE-EXPORTS: Plan
// =============================================================================

pub use plan::{
    DEFAULT_ATTEMPT_TIMEOUT_MS, DEFAULT_CONFIG_FILE, DEFAULT_HTTP_PATH, DEFAULT_INITIAL_DELAY_MS,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_TARGET_HOST, DEFAULT_TARGET_PORT, DEFAULT_TIMEOUT_MS,
    GatePlan, Successor, Timing, TimingOverrides,
};
