//! # Gate Plan
//!
//! The resolved description of one gate run: timing, the ordered
//! preconditions and the successor to hand off to.
//!
//! A plan can come from three places, in increasing precedence:
//! 1. Built-in defaults (the `DEFAULT_*` constants below)
//! 2. A TOML plan file
//! 3. Command-line flags and their environment variables ([`TimingOverrides`])
//!
//! ## Plan File Format
//!
//! ```toml
//! [timing]
//! timeout_ms = 120000
//! poll_interval_ms = 500
//!
//! [[precondition]]
//! kind = "file"
//! path = "/app/config/local.js"
//!
//! [[precondition]]
//! kind = "http"
//! host = "api_sails"
//! port = 1337
//!
//! [successor]
//! program = "node"
//! args = ["app.js"]
//! ```

use crate::poll::PollPolicy;
use crate::types::{GateError, Precondition};
use serde::{Deserialize, Serialize};
use std::net::Ipv6Addr;
use std::path::Path;
use std::time::Duration;

// =============================================================================
// DEFAULTS
// =============================================================================

/// Host probed by the DNS and HTTP checks of the default plan.
pub const DEFAULT_TARGET_HOST: &str = "api_sails";

/// Port probed by the HTTP check of the default plan.
pub const DEFAULT_TARGET_PORT: u16 = 1337;

/// Path requested by HTTP checks.
pub const DEFAULT_HTTP_PATH: &str = "/robots.txt";

/// File required by the static check of the default plan.
pub const DEFAULT_CONFIG_FILE: &str = "/app/config/local.js";

/// Budget of each polling check (2 minutes).
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Delay between attempts of a polling check.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Delay before the first polling check, for infrastructure startup skew.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 5_000;

/// Upper bound of a single probe attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// TIMING
// =============================================================================

/// Timing section of a plan. All values in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timing {
    /// Budget of each polling check.
    pub timeout_ms: u64,
    /// Delay between attempts.
    pub poll_interval_ms: u64,
    /// Delay before the first polling check.
    pub initial_delay_ms: u64,
    /// Upper bound of one probe attempt.
    pub attempt_timeout_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            attempt_timeout_ms: DEFAULT_ATTEMPT_TIMEOUT_MS,
        }
    }
}

impl Timing {
    /// Reject timings the gate cannot run with.
    pub fn validate(&self) -> Result<(), GateError> {
        if self.poll_interval_ms == 0 {
            return Err(GateError::InvalidConfig(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.attempt_timeout_ms == 0 {
            return Err(GateError::InvalidConfig(
                "attempt_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply the overrides that are set.
    #[must_use]
    pub fn with_overrides(self, overrides: &TimingOverrides) -> Self {
        Self {
            timeout_ms: overrides.timeout_ms.unwrap_or(self.timeout_ms),
            poll_interval_ms: overrides.poll_interval_ms.unwrap_or(self.poll_interval_ms),
            initial_delay_ms: overrides.initial_delay_ms.unwrap_or(self.initial_delay_ms),
            attempt_timeout_ms: overrides
                .attempt_timeout_ms
                .unwrap_or(self.attempt_timeout_ms),
        }
    }

    /// Retry policy of polling checks.
    #[must_use]
    pub const fn policy(&self) -> PollPolicy {
        PollPolicy::from_timing(self)
    }

    /// Initial delay as a duration.
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Attempt timeout as a duration.
    #[must_use]
    pub const fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

/// Timing values given on the command line or in the environment.
///
/// `None` leaves the plan's value in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingOverrides {
    /// Override for [`Timing::timeout_ms`].
    pub timeout_ms: Option<u64>,
    /// Override for [`Timing::poll_interval_ms`].
    pub poll_interval_ms: Option<u64>,
    /// Override for [`Timing::initial_delay_ms`].
    pub initial_delay_ms: Option<u64>,
    /// Override for [`Timing::attempt_timeout_ms`].
    pub attempt_timeout_ms: Option<u64>,
}

// =============================================================================
// SUCCESSOR
// =============================================================================

/// The program control is handed to once every precondition holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Successor {
    /// Executable name or path, resolved through `PATH`.
    pub program: String,
    /// Arguments, passed through untouched.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Successor {
    /// Create a successor from a program and its arguments.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split an argv-style command into program and arguments.
    pub fn from_command(mut argv: Vec<String>) -> Result<Self, GateError> {
        if argv.is_empty() {
            return Err(GateError::InvalidConfig(
                "successor command is empty".to_string(),
            ));
        }
        let program = argv.remove(0);
        if program.trim().is_empty() {
            return Err(GateError::InvalidConfig(
                "successor program is empty".to_string(),
            ));
        }
        Ok(Self::new(program, argv))
    }

    /// The command as a single display string.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// =============================================================================
// GATE PLAN
// =============================================================================

/// Everything a gate run needs. Also the schema of a plan file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatePlan {
    /// Timing for every check of the plan.
    #[serde(default)]
    pub timing: Timing,

    /// Checks, evaluated strictly in order.
    #[serde(default, rename = "precondition")]
    pub preconditions: Vec<Precondition>,

    /// Program to hand off to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successor: Option<Successor>,
}

impl GatePlan {
    /// The launcher's built-in plan: required config file, then DNS, then HTTP.
    #[must_use]
    pub fn standard(
        config_file: impl AsRef<Path>,
        target_host: &str,
        target_port: u16,
        http_path: &str,
    ) -> Self {
        Self {
            timing: Timing::default(),
            preconditions: vec![
                Precondition::file(config_file.as_ref()),
                Precondition::dns(target_host),
                Precondition::http(target_host, target_port, http_path),
            ],
            successor: None,
        }
    }

    /// Parse a plan from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, GateError> {
        toml::from_str(text).map_err(|e| GateError::InvalidConfig(format!("plan file: {e}")))
    }

    /// Read and parse a plan file.
    pub fn load(path: &Path) -> Result<Self, GateError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GateError::InvalidConfig(format!("cannot read plan '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Render the plan as TOML.
    pub fn to_toml_string(&self) -> Result<String, GateError> {
        toml::to_string(self).map_err(|e| GateError::InvalidConfig(format!("plan file: {e}")))
    }

    /// Replace the successor.
    #[must_use]
    pub fn with_successor(mut self, successor: Successor) -> Self {
        self.successor = Some(successor);
        self
    }

    /// Reject plans the gate cannot run.
    ///
    /// A missing successor is not an error here; only the handoff needs one.
    pub fn validate(&self) -> Result<(), GateError> {
        self.timing.validate()?;
        for check in &self.preconditions {
            match check {
                Precondition::File { path } if path.as_os_str().is_empty() => {
                    return Err(GateError::InvalidConfig(
                        "file precondition has an empty path".to_string(),
                    ));
                }
                Precondition::Dns { host } | Precondition::Http { host, .. }
                    if host.trim().is_empty() =>
                {
                    return Err(GateError::InvalidConfig(format!(
                        "{} precondition has an empty host",
                        kind_name(check)
                    )));
                }
                Precondition::Http { host, .. } if !is_url_host(host) => {
                    return Err(GateError::InvalidConfig(format!(
                        "http precondition host '{host}' cannot appear in a URL"
                    )));
                }
                Precondition::Http { port: 0, .. } => {
                    return Err(GateError::InvalidConfig(
                        "http precondition has port 0".to_string(),
                    ));
                }
                _ => {}
            }
        }
        if self
            .successor
            .as_ref()
            .is_some_and(|s| s.program.trim().is_empty())
        {
            return Err(GateError::InvalidConfig(
                "successor program is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A hostname, an IPv4 literal or an IPv6 literal, bracketed or not.
fn is_url_host(host: &str) -> bool {
    if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        return inner.parse::<Ipv6Addr>().is_ok();
    }
    host.parse::<Ipv6Addr>().is_ok()
        || host
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '.' | '_'))
}

fn kind_name(check: &Precondition) -> &'static str {
    match check {
        Precondition::File { .. } => "file",
        Precondition::Dns { .. } => "dns",
        Precondition::Http { .. } => "http",
    }
}

// =============================================================================
// TESTS
// =============================================================================
