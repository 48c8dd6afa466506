//! # HTTP Reachability Probe
//!
//! A GET that counts as ready as soon as the server answers at all. Status
//! codes are not inspected: a 404 or a 500 still proves the service is up and
//! accepting connections. Redirects are not followed and proxies from the
//! environment are ignored, so the probe talks to exactly the target given.

use readygate_core::{GateError, ProbeOutcome};
use std::time::Duration;

/// Errors from one HTTP attempt.
#[derive(Debug)]
pub enum HttpProbeError {
    /// Connection refused, reset, or the name did not resolve.
    ConnectionFailed(String),
    /// No response within the attempt timeout.
    TimedOut(String),
    /// The URL could not be turned into a request.
    InvalidUrl(String),
}

impl std::fmt::Display for HttpProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed(msg) => write!(f, "Cannot connect: {msg}"),
            Self::TimedOut(url) => write!(f, "No response from {url} before timeout"),
            Self::InvalidUrl(msg) => write!(f, "Invalid URL: {msg}"),
        }
    }
}

impl std::error::Error for HttpProbeError {}

/// HTTP client configured for reachability checks.
#[derive(Clone)]
pub struct HttpProbe {
    http: reqwest::Client,
}

impl HttpProbe {
    /// Create a probe whose attempts give up after `attempt_timeout`.
    pub fn new(attempt_timeout: Duration) -> Result<Self, GateError> {
        let http = reqwest::Client::builder()
            .timeout(attempt_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()
            .map_err(|e| GateError::InvalidConfig(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Issue one GET and return the status of whatever answered.
    ///
    /// The body is never read.
    pub async fn reach(&self, url: &str) -> Result<reqwest::StatusCode, HttpProbeError> {
        let resp = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                HttpProbeError::TimedOut(url.to_string())
            } else if e.is_builder() {
                HttpProbeError::InvalidUrl(format!("{url}: {e}"))
            } else {
                HttpProbeError::ConnectionFailed(format!("{url}: {e}"))
            }
        })?;
        Ok(resp.status())
    }

    /// Ready on any response.
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.reach(url).await {
            Ok(status) => {
                tracing::debug!(url, status = status.as_u16(), "target answered");
                ProbeOutcome::Ready
            }
            Err(e) => ProbeOutcome::not_ready(e),
        }
    }
}
