//! DNS readiness probe.

use readygate_core::ProbeOutcome;
use std::net::{IpAddr, Ipv4Addr};

/// Resolve a hostname to its IPv4 addresses.
///
/// IPv6 results are discarded. No caching: every call hits the resolver.
pub async fn resolve_ipv4(host: &str) -> std::io::Result<Vec<Ipv4Addr>> {
    let addrs = tokio::net::lookup_host((host, 0)).await?;
    Ok(addrs
        .filter_map(|addr| match addr.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .collect())
}

/// Ready once `host` has at least one IPv4 address.
pub async fn probe_dns(host: &str) -> ProbeOutcome {
    match resolve_ipv4(host).await {
        Ok(addrs) => match addrs.first() {
            Some(addr) => {
                tracing::debug!(host, %addr, "domain resolved");
                ProbeOutcome::Ready
            }
            None => ProbeOutcome::not_ready(format!("{host} has no IPv4 address")),
        },
        Err(e) => ProbeOutcome::not_ready(format!("cannot resolve {host}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loopback_literal_resolves() {
        let addrs = resolve_ipv4("127.0.0.1").await.expect("resolve");
        assert_eq!(addrs, vec![Ipv4Addr::LOCALHOST]);
        assert!(probe_dns("127.0.0.1").await.is_ready());
    }

    #[tokio::test]
    async fn ipv6_only_literal_is_not_ready() {
        assert!(!probe_dns("::1").await.is_ready());
    }

    #[tokio::test]
    async fn invalid_name_is_not_ready() {
        assert!(!probe_dns("readygate.invalid").await.is_ready());
    }
}
