//! # Readygate CLI Module
//!
//! This module implements the CLI interface for readygate.
//!
//! ## Available Commands
//!
//! - `run -- <command...>` - Wait for every precondition, then hand off
//! - `check` - Wait for every precondition and report, without handoff
//! - `plan` - Print the resolved plan without probing anything
//!
//! Every option can also be set through the environment variable shown in
//! `--help`. Flags beat environment variables, which beat the plan file,
//! which beats the built-in defaults.

mod commands;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use readygate_core::{
    DEFAULT_CONFIG_FILE, DEFAULT_HTTP_PATH, DEFAULT_TARGET_HOST, DEFAULT_TARGET_PORT, GateError,
    GatePlan, Successor, TimingOverrides,
};
use std::path::{Path, PathBuf};

use crate::handoff::HandoffMode;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// readygate - wait for dependencies, then start the service
///
/// Checks that a config file exists, waits for a host to resolve and answer
/// HTTP, then replaces itself with the given command.
#[derive(Parser, Debug)]
#[command(name = "readygate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// TOML plan file with timing, preconditions and successor
    #[arg(long, global = true, env = "READYGATE_PLAN")]
    pub plan: Option<PathBuf>,

    /// Host of the DNS and HTTP checks [default: api_sails]
    #[arg(long, global = true, env = "READYGATE_TARGET_HOST")]
    pub target_host: Option<String>,

    /// Port of the HTTP check [default: 1337]
    #[arg(long, global = true, env = "READYGATE_TARGET_PORT")]
    pub target_port: Option<u16>,

    /// Path of the HTTP check [default: /robots.txt]
    #[arg(long, global = true, env = "READYGATE_HTTP_PATH")]
    pub http_path: Option<String>,

    /// File that must exist before anything else [default: /app/config/local.js]
    #[arg(long, global = true, env = "READYGATE_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Budget of each polling check in ms [default: 120000]
    #[arg(long, global = true, env = "READYGATE_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Delay between attempts in ms [default: 500]
    #[arg(long, global = true, env = "READYGATE_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Delay before the first polling check in ms [default: 5000]
    #[arg(long, global = true, env = "READYGATE_INITIAL_DELAY_MS")]
    pub initial_delay_ms: Option<u64>,

    /// Upper bound of one probe attempt in ms [default: 5000]
    #[arg(long, global = true, env = "READYGATE_ATTEMPT_TIMEOUT_MS")]
    pub attempt_timeout_ms: Option<u64>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait for every precondition, then hand off to the successor
    Run {
        /// How to start the successor
        #[arg(long, value_enum, default_value_t = HandoffMode::Exec, env = "READYGATE_HANDOFF")]
        handoff: HandoffMode,

        /// Successor command, after `--`
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// Wait for every precondition and report, without handoff
    Check,

    /// Print the resolved plan without probing
    Plan,
}

// =============================================================================
// PLAN RESOLUTION
// =============================================================================

impl Cli {
    /// Timing values set by flags or environment.
    pub fn timing_overrides(&self) -> TimingOverrides {
        TimingOverrides {
            timeout_ms: self.timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
            initial_delay_ms: self.initial_delay_ms,
            attempt_timeout_ms: self.attempt_timeout_ms,
        }
    }

    fn targets_overridden(&self) -> bool {
        self.target_host.is_some()
            || self.target_port.is_some()
            || self.http_path.is_some()
            || self.config_file.is_some()
    }

    /// Build the plan this invocation runs.
    ///
    /// A plan file without preconditions gets the standard
    /// file → DNS → HTTP sequence built from the target options. The target
    /// options are ignored, with a warning, when the plan file lists its own.
    pub fn resolve_plan(&self) -> Result<GatePlan, GateError> {
        let mut plan = match &self.plan {
            Some(path) => GatePlan::load(path)?,
            None => GatePlan::default(),
        };

        if plan.preconditions.is_empty() {
            let standard = GatePlan::standard(
                self.config_file
                    .as_deref()
                    .unwrap_or(Path::new(DEFAULT_CONFIG_FILE)),
                self.target_host.as_deref().unwrap_or(DEFAULT_TARGET_HOST),
                self.target_port.unwrap_or(DEFAULT_TARGET_PORT),
                self.http_path.as_deref().unwrap_or(DEFAULT_HTTP_PATH),
            );
            plan.preconditions = standard.preconditions;
        } else if self.targets_overridden() {
            tracing::warn!(
                "target options ignored: the plan file defines its own preconditions"
            );
        }

        plan.timing = plan.timing.with_overrides(&self.timing_overrides());

        match &self.command {
            Commands::Run { command, .. } if !command.is_empty() => {
                plan = plan.with_successor(Successor::from_command(command.clone())?);
            }
            _ => {}
        }

        plan.validate()?;
        Ok(plan)
    }
}

/// Exit status for a command line clap refused.
///
/// `--help` and `--version` keep clap's own status. Any other rejection,
/// such as a malformed READYGATE_* value, is a configuration error.
pub fn parse_failure_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit_code(),
        _ => GateError::InvalidConfig(err.to_string()).exit_code(),
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
///
/// Returns the process exit status.
pub async fn execute(cli: Cli) -> Result<i32, GateError> {
    let plan = cli.resolve_plan()?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Run { handoff, .. } => cmd_run(&plan, handoff).await,
        Commands::Check => cmd_check(&plan, json_mode).await.map(|()| 0),
        Commands::Plan => cmd_plan(&plan, json_mode).map(|()| 0),
    }
}
