//! # Successor Handoff
//!
//! Transfers control to the dependent service once the gate has passed.
//!
//! - `exec` replaces the readygate process image (Unix). The successor keeps
//!   the PID, environment and standard streams, so a supervisor watching
//!   readygate ends up watching the service.
//! - `spawn` runs the successor as a child, waits for it and forwards its
//!   exit status. This is also the fallback where `exec` does not exist.

use readygate_core::{GateError, Successor};
use std::future::Future;

/// How control is handed to the successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HandoffMode {
    /// Replace the current process.
    #[default]
    Exec,
    /// Run as a child and forward its exit status.
    Spawn,
}

/// Starts the successor.
pub trait Launcher {
    /// Hand off to `successor`.
    ///
    /// Returns the exit status to terminate with. A successful `exec` never
    /// returns.
    fn launch(
        &mut self,
        successor: &Successor,
    ) -> impl Future<Output = Result<i32, GateError>> + Send;
}

/// Launcher that starts real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher {
    mode: HandoffMode,
}

impl ProcessLauncher {
    /// Create a launcher for the given mode.
    pub const fn new(mode: HandoffMode) -> Self {
        Self { mode }
    }
}

impl Launcher for ProcessLauncher {
    async fn launch(&mut self, successor: &Successor) -> Result<i32, GateError> {
        match self.mode {
            HandoffMode::Exec => exec(successor).await,
            HandoffMode::Spawn => spawn_and_wait(successor).await,
        }
    }
}

#[cfg(unix)]
async fn exec(successor: &Successor) -> Result<i32, GateError> {
    use std::os::unix::process::CommandExt;

    let err = std::process::Command::new(&successor.program)
        .args(&successor.args)
        .exec();
    Err(GateError::HandoffFailure(format!(
        "cannot exec '{}': {err}",
        successor.program
    )))
}

#[cfg(not(unix))]
async fn exec(successor: &Successor) -> Result<i32, GateError> {
    tracing::debug!("exec is not available on this platform, spawning instead");
    spawn_and_wait(successor).await
}

/// The wait is async so the runtime keeps serving signals and timers while
/// the child runs.
async fn spawn_and_wait(successor: &Successor) -> Result<i32, GateError> {
    let status = tokio::process::Command::new(&successor.program)
        .args(&successor.args)
        .status()
        .await
        .map_err(|e| {
            GateError::HandoffFailure(format!("cannot start '{}': {e}", successor.program))
        })?;

    // Killed by a signal: no code to forward.
    let code = status.code().unwrap_or(1);
    tracing::info!(code, "{} exited", successor.program);
    Ok(code)
}

// =============================================================================
// TESTS
// =============================================================================
