//! Hickory-backed implementation of [`DnsProbe`].

mod lookup;
mod resolver;

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioResolver;

use crate::error::{ProbeError, ProbeResult};
use crate::traits::DnsProbe;
use crate::types::DnsDiff;

/// Default per-lookup timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// DNS probe backed by a `hickory-resolver` instance with caching disabled.
///
/// Every lookup is bounded by `timeout`; a lookup that exceeds it fails with
/// [`ProbeError::Timeout`] instead of stalling the caller.
///
/// ```rust,no_run
/// use domain_verifier_probe::{DnsProbe, HickoryDnsProbe};
/// # async fn demo() -> domain_verifier_probe::ProbeResult<()> {
/// let probe = HickoryDnsProbe::system(std::time::Duration::from_secs(5));
/// let diff = probe.resolve_txt_diff("habemus-verify.example.com", "abc123").await?;
/// # Ok(())
/// # }
/// ```
pub struct HickoryDnsProbe {
    resolver: TokioResolver,
    timeout: Duration,
}

impl HickoryDnsProbe {
    /// Probe through the host system's resolver configuration.
    #[must_use]
    pub fn system(timeout: Duration) -> Self {
        Self {
            resolver: resolver::build_resolver(&[], timeout),
            timeout,
        }
    }

    /// Probe through specific nameservers (falls back to the system
    /// configuration when `nameservers` is empty).
    #[must_use]
    pub fn with_nameservers(nameservers: &[IpAddr], timeout: Duration) -> Self {
        Self {
            resolver: resolver::build_resolver(nameservers, timeout),
            timeout,
        }
    }

    async fn timed<F>(&self, host: &str, lookup: F) -> ProbeResult<Vec<String>>
    where
        F: Future<Output = ProbeResult<Vec<String>>> + Send,
    {
        if host.trim().is_empty() {
            return Err(ProbeError::InvalidInput("host name is empty".to_string()));
        }

        tokio::time::timeout(self.timeout, lookup)
            .await
            .map_err(|_| ProbeError::Timeout {
                host: host.to_string(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }
}

#[async_trait]
impl DnsProbe for HickoryDnsProbe {
    async fn resolve_ipv4_diff(
        &self,
        domain: &str,
        expected: &[Ipv4Addr],
    ) -> ProbeResult<DnsDiff> {
        let actual = self
            .timed(domain, lookup::lookup_ipv4(&self.resolver, domain))
            .await?;
        let expected: Vec<String> = expected.iter().map(ToString::to_string).collect();
        Ok(DnsDiff::compute(&expected, &actual))
    }

    async fn resolve_cname_diff(
        &self,
        alias_domain: &str,
        target_domain: &str,
    ) -> ProbeResult<DnsDiff> {
        let actual = self
            .timed(alias_domain, lookup::lookup_cname(&self.resolver, alias_domain))
            .await?;
        Ok(DnsDiff::compute(
            &[lookup::normalize_name(target_domain)],
            &actual,
        ))
    }

    async fn resolve_txt_diff(
        &self,
        challenge_domain: &str,
        expected_code: &str,
    ) -> ProbeResult<DnsDiff> {
        let actual = self
            .timed(
                challenge_domain,
                lookup::lookup_txt(&self.resolver, challenge_domain),
            )
            .await?;
        Ok(DnsDiff::compute(&[expected_code], &actual))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_host_is_invalid_input() {
        let probe = HickoryDnsProbe::with_nameservers(
            &["127.0.0.1".parse().unwrap()],
            Duration::from_millis(200),
        );
        let err = probe.resolve_txt_diff("  ", "code").await.unwrap_err();
        assert_eq!(
            err,
            ProbeError::InvalidInput("host name is empty".to_string())
        );
    }

    #[tokio::test]
    async fn slow_lookup_times_out() {
        let probe = HickoryDnsProbe::with_nameservers(
            &["127.0.0.1".parse().unwrap()],
            Duration::from_millis(20),
        );
        let err = probe
            .timed("slow.example.com", async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(Vec::new())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Timeout { ref host, timeout_ms: 20 } if host == "slow.example.com"));
        assert!(err.is_transient());
    }
}
