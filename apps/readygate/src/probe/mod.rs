//! # Readiness Probes
//!
//! A probe answers one question about one precondition: does it hold right
//! now? Probes never retry and never sleep; the gate owns the polling loop.
//!
//! - `file` preconditions → `Path::exists`
//! - `dns` preconditions → IPv4 lookup through the system resolver
//! - `http` preconditions → a GET that succeeds on any response

mod dns;
mod http;

pub use dns::{probe_dns, resolve_ipv4};
pub use http::{HttpProbe, HttpProbeError};

use readygate_core::{GateError, Precondition, ProbeOutcome};
use std::future::Future;
use std::path::Path;
use std::time::Duration;

// =============================================================================
// PROBER TRAIT
// =============================================================================

/// Evaluates a single attempt of a precondition.
///
/// Implementations must not loop; one call is one attempt.
pub trait Prober: Send + Sync {
    /// Probe the precondition once.
    fn probe(&self, check: &Precondition) -> impl Future<Output = ProbeOutcome> + Send;
}

// =============================================================================
// SYSTEM PROBER
// =============================================================================

/// Prober backed by the real filesystem, resolver and network.
#[derive(Clone)]
pub struct SystemProber {
    http: HttpProbe,
}

impl SystemProber {
    /// Create a prober whose HTTP attempts give up after `attempt_timeout`.
    pub fn new(attempt_timeout: Duration) -> Result<Self, GateError> {
        Ok(Self {
            http: HttpProbe::new(attempt_timeout)?,
        })
    }
}

impl Prober for SystemProber {
    async fn probe(&self, check: &Precondition) -> ProbeOutcome {
        match check {
            Precondition::File { path } => probe_file(path),
            Precondition::Dns { host } => probe_dns(host).await,
            Precondition::Http { .. } => match check.url() {
                Some(url) => self.http.probe(&url).await,
                None => ProbeOutcome::not_ready("no URL for http precondition"),
            },
        }
    }
}

/// Check that a path exists.
pub fn probe_file(path: &Path) -> ProbeOutcome {
    if path.exists() {
        ProbeOutcome::Ready
    } else {
        ProbeOutcome::not_ready(format!("{} does not exist", path.display()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_ready() {
        let outcome = probe_file(Path::new("/nonexistent/readygate/local.js"));
        assert!(!outcome.is_ready());
    }

    #[test]
    fn existing_file_is_ready() {
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        assert_eq!(probe_file(file.path()), ProbeOutcome::Ready);
    }
}
