//! Integration tests for the system probes against real local targets.
//!
//! Uses axum to stand up a throwaway HTTP service on 127.0.0.1.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::{Router, http::StatusCode, routing::get};
use readygate::probe::{HttpProbe, HttpProbeError};
use readygate::{Gate, Prober, SystemProber};
use readygate_core::{GateError, GatePlan, Precondition, ProbeOutcome, Timing};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Serve `/robots.txt` with the given status. Other paths get axum's 404.
async fn spawn_server(status: StatusCode) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/robots.txt", get(move || async move { status }));
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}

/// Serve `/robots.txt` on the IPv6 loopback, `None` when the host has no IPv6.
async fn spawn_ipv6_server() -> Option<SocketAddr> {
    let listener = TcpListener::bind("[::1]:0").await.ok()?;
    let addr = listener.local_addr().ok()?;
    let app = Router::new().route("/robots.txt", get(|| async { StatusCode::OK }));
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Some(addr)
}

/// Accept connections and never answer.
async fn spawn_silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// An address nothing listens on.
async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn http_check(addr: SocketAddr, path: &str) -> Precondition {
    Precondition::http(addr.ip().to_string(), addr.port(), path)
}

fn quick_timing() -> Timing {
    Timing {
        timeout_ms: 300,
        poll_interval_ms: 100,
        initial_delay_ms: 0,
        attempt_timeout_ms: 200,
    }
}

// =============================================================================
// HTTP PROBE
// =============================================================================

#[tokio::test]
async fn any_status_counts_as_reachable() {
    let probe = HttpProbe::new(Duration::from_secs(5)).unwrap();

    let ok = spawn_server(StatusCode::OK).await;
    let failing = spawn_server(StatusCode::INTERNAL_SERVER_ERROR).await;

    assert_eq!(
        probe.probe(&format!("http://{ok}/robots.txt")).await,
        ProbeOutcome::Ready
    );
    assert_eq!(
        probe.probe(&format!("http://{failing}/robots.txt")).await,
        ProbeOutcome::Ready
    );
    assert_eq!(
        probe
            .reach(&format!("http://{ok}/not-there"))
            .await
            .unwrap(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn refused_connection_is_not_ready() {
    let probe = HttpProbe::new(Duration::from_secs(5)).unwrap();
    let addr = closed_addr().await;

    let err = probe
        .reach(&format!("http://{addr}/robots.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, HttpProbeError::ConnectionFailed(_)));
}

#[tokio::test]
async fn malformed_url_is_invalid_not_unreachable() {
    let probe = HttpProbe::new(Duration::from_secs(5)).unwrap();

    let err = probe.reach("http://::1:8080/robots.txt").await.unwrap_err();
    assert!(matches!(err, HttpProbeError::InvalidUrl(_)), "got {err}");
}

#[tokio::test]
async fn silent_server_times_out() {
    let probe = HttpProbe::new(Duration::from_millis(200)).unwrap();
    let addr = spawn_silent_server().await;

    let err = probe
        .reach(&format!("http://{addr}/robots.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, HttpProbeError::TimedOut(_)));
}

// =============================================================================
// SYSTEM PROBER + GATE
// =============================================================================

#[tokio::test]
async fn system_prober_dispatches_on_kind() {
    let prober = SystemProber::new(Duration::from_secs(5)).unwrap();
    let file = tempfile::NamedTempFile::new().unwrap();
    let addr = spawn_server(StatusCode::OK).await;

    assert!(prober.probe(&Precondition::file(file.path())).await.is_ready());
    assert!(prober.probe(&Precondition::dns("127.0.0.1")).await.is_ready());
    assert!(
        prober
            .probe(&http_check(addr, "/robots.txt"))
            .await
            .is_ready()
    );
    assert!(
        !prober
            .probe(&Precondition::file("/nonexistent/readygate/local.js"))
            .await
            .is_ready()
    );
}

#[tokio::test]
async fn gate_passes_against_live_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("local.js");
    std::fs::write(&config, "module.exports = {};").unwrap();
    let addr = spawn_server(StatusCode::NOT_FOUND).await;

    let plan = GatePlan {
        timing: quick_timing(),
        preconditions: vec![
            Precondition::file(&config),
            Precondition::dns("127.0.0.1"),
            http_check(addr, "/robots.txt"),
        ],
        successor: None,
    };
    let gate = Gate::new(SystemProber::new(plan.timing.attempt_timeout()).unwrap());

    let report = gate.run(&plan).await.unwrap();
    assert_eq!(report.checks.len(), 3);
    assert!(report.checks.iter().all(|c| c.attempts == 1));
}

#[tokio::test]
async fn gate_reports_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("local.js");
    let plan = GatePlan {
        timing: quick_timing(),
        preconditions: vec![Precondition::file(&missing), Precondition::dns("127.0.0.1")],
        successor: None,
    };
    let gate = Gate::new(SystemProber::new(plan.timing.attempt_timeout()).unwrap());

    let err = gate.run(&plan).await.unwrap_err();
    assert_eq!(err, GateError::ConfigMissing { path: missing });
}

#[tokio::test]
async fn gate_gives_up_on_closed_port() {
    let addr = closed_addr().await;
    let plan = GatePlan {
        timing: quick_timing(),
        preconditions: vec![http_check(addr, "/robots.txt")],
        successor: None,
    };
    let gate = Gate::new(SystemProber::new(plan.timing.attempt_timeout()).unwrap());

    let err = gate.run(&plan).await.unwrap_err();
    assert!(matches!(err, GateError::DependencyUnreachable { .. }));
}

#[tokio::test]
async fn gate_reaches_ipv6_literal_target() {
    let Some(addr) = spawn_ipv6_server().await else {
        return;
    };
    let plan = GatePlan {
        timing: quick_timing(),
        preconditions: vec![Precondition::http("::1", addr.port(), "/robots.txt")],
        successor: None,
    };
    let gate = Gate::new(SystemProber::new(plan.timing.attempt_timeout()).unwrap());

    let report = gate.run(&plan).await.unwrap();
    assert_eq!(report.checks[0].attempts, 1);
    assert_eq!(
        report.checks[0].label,
        format!("http://[::1]:{}/robots.txt", addr.port())
    );
}

#[tokio::test]
async fn gate_rejects_unusable_http_host_before_waiting() {
    let plan = GatePlan {
        timing: quick_timing(),
        preconditions: vec![Precondition::http("api sails", 1337, "/robots.txt")],
        successor: None,
    };
    let gate = Gate::new(SystemProber::new(plan.timing.attempt_timeout()).unwrap());

    let started = tokio::time::Instant::now();
    let err = gate.run(&plan).await.unwrap_err();
    assert!(matches!(err, GateError::InvalidConfig(_)), "got {err}");
    assert!(started.elapsed() < Duration::from_millis(100));
}
