//! # Core Type Definitions
//!
//! This module contains the value types shared by every part of readygate:
//! - Precondition descriptors (`Precondition`, `CheckMode`)
//! - Probe results (`ProbeOutcome`)
//! - Run summaries (`CheckReport`, `GateReport`)
//! - Error types (`GateError`)
//!
//! None of these types carry identity or outlive a single gate run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv6Addr;
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// CHECK MODE
// =============================================================================

/// How a precondition is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    /// Evaluated exactly once. Failure is immediately fatal.
    Static,
    /// Re-probed on a fixed interval until success or the global timeout.
    Polling,
}

// =============================================================================
// PRECONDITION
// =============================================================================

/// A named check that must hold before the gate proceeds.
///
/// The serialized form is the `[[precondition]]` table of a plan file,
/// discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Precondition {
    /// The path must exist.
    File {
        /// Path whose existence is required.
        path: PathBuf,
    },
    /// The hostname must resolve to at least one IPv4 address.
    Dns {
        /// Hostname to resolve.
        host: String,
    },
    /// A GET to `http://host:port/path` must produce any response at all.
    Http {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
        /// Request path. A missing leading `/` is added.
        #[serde(default = "default_http_path")]
        path: String,
    },
}

fn default_http_path() -> String {
    crate::plan::DEFAULT_HTTP_PATH.to_string()
}

impl Precondition {
    /// Create a file existence check.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Create a DNS resolution check.
    #[must_use]
    pub fn dns(host: impl Into<String>) -> Self {
        Self::Dns { host: host.into() }
    }

    /// Create an HTTP reachability check.
    #[must_use]
    pub fn http(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self::Http {
            host: host.into(),
            port,
            path: path.into(),
        }
    }

    /// Whether this check is evaluated once or polled.
    #[must_use]
    pub const fn mode(&self) -> CheckMode {
        match self {
            Self::File { .. } => CheckMode::Static,
            Self::Dns { .. } | Self::Http { .. } => CheckMode::Polling,
        }
    }

    /// Full URL of an HTTP check, `None` for other kinds.
    #[must_use]
    pub fn url(&self) -> Option<String> {
        match self {
            Self::Http { host, port, path } => {
                let sep = if path.starts_with('/') { "" } else { "/" };
                // IPv6 literals need brackets to be told apart from the port.
                if host.parse::<Ipv6Addr>().is_ok() {
                    Some(format!("http://[{host}]:{port}{sep}{path}"))
                } else {
                    Some(format!("http://{host}:{port}{sep}{path}"))
                }
            }
            _ => None,
        }
    }

    /// Short human-readable name used in logs and reports.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::File { path } => format!("file {}", path.display()),
            Self::Dns { host } => format!("domain {host}"),
            Self::Http { .. } => self.url().unwrap_or_default(),
        }
    }

    /// Progress line printed when the check starts.
    #[must_use]
    pub fn waiting_message(&self) -> String {
        match self {
            Self::File { path } => format!("Checking {}...", path.display()),
            Self::Dns { host } => format!("Looking for {host} domain..."),
            Self::Http { .. } => format!("Waiting for {}...", self.label()),
        }
    }

    /// Line announced when the check passes, if any.
    ///
    /// Only the HTTP check, the last step of the standard plan, says "OK!".
    #[must_use]
    pub const fn ready_message(&self) -> Option<&'static str> {
        match self {
            Self::Http { .. } => Some("OK!"),
            Self::File { .. } | Self::Dns { .. } => None,
        }
    }

    /// The error reported when this check gives up.
    ///
    /// Static checks give up after one attempt, polling checks when their
    /// global timeout is spent.
    #[must_use]
    pub fn failure(&self, attempts: u32, elapsed_ms: u64) -> GateError {
        match self {
            Self::File { path } => GateError::ConfigMissing { path: path.clone() },
            Self::Dns { host } => GateError::DependencyUnresolved {
                host: host.clone(),
                attempts,
                elapsed_ms,
            },
            Self::Http { .. } => GateError::DependencyUnreachable {
                target: self.label(),
                attempts,
                elapsed_ms,
            },
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// =============================================================================
// PROBE OUTCOME
// =============================================================================

/// Result of a single probe attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The precondition holds.
    Ready,
    /// The precondition does not hold yet. Carries the reason for logging.
    NotReady(String),
}

impl ProbeOutcome {
    /// Create a not-ready outcome from anything displayable.
    #[must_use]
    pub fn not_ready(reason: impl fmt::Display) -> Self {
        Self::NotReady(reason.to_string())
    }

    /// Check if the probe succeeded.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

// =============================================================================
// REPORTS
// =============================================================================

/// Summary of one precondition that passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    /// Label of the precondition.
    pub label: String,
    /// How it was evaluated.
    pub mode: CheckMode,
    /// Number of probe attempts, including the successful one.
    pub attempts: u32,
    /// Wall time spent on the check.
    pub elapsed_ms: u64,
}

/// Summary of a gate run in which every precondition passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateReport {
    /// Per-check results, in evaluation order.
    pub checks: Vec<CheckReport>,
    /// Initial delay actually taken.
    pub initial_delay_ms: u64,
    /// Wall time of the whole run, initial delay included.
    pub total_elapsed_ms: u64,
}

impl GateReport {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a passed check.
    pub fn record(&mut self, check: CheckReport) {
        self.checks.push(check);
    }

    /// Total number of probe attempts across all checks.
    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.checks
            .iter()
            .fold(0u32, |acc, c| acc.saturating_add(c.attempts))
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can stop the gate.
///
/// Every variant is terminal: the binary prints it and exits with
/// [`GateError::exit_code`]. There is no partial success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// A static check failed: the required file is absent.
    #[error("Error: {} file not found.", path.display())]
    ConfigMissing {
        /// Missing path.
        path: PathBuf,
    },

    /// Name resolution kept failing until the global timeout.
    #[error("Timeout while waiting for domain {host} ({attempts} attempts in {elapsed_ms} ms)")]
    DependencyUnresolved {
        /// Hostname that never resolved.
        host: String,
        /// Probe attempts made.
        attempts: u32,
        /// Time spent before giving up.
        elapsed_ms: u64,
    },

    /// A network probe kept failing until the global timeout.
    #[error("Timeout while waiting for {target} ({attempts} attempts in {elapsed_ms} ms)")]
    DependencyUnreachable {
        /// Unreachable target.
        target: String,
        /// Probe attempts made.
        attempts: u32,
        /// Time spent before giving up.
        elapsed_ms: u64,
    },

    /// The successor could not be executed.
    #[error("Handoff failed: {0}")]
    HandoffFailure(String),

    /// The plan, a flag, or an environment override is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GateError {
    /// Process exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }
}

// =============================================================================
// TESTS
// =============================================================================
