use std::net::Ipv4Addr;

use async_trait::async_trait;

use crate::error::ProbeResult;
use crate::types::DnsDiff;

/// DNS probe Trait
///
/// The three lookups a verification cycle needs. Implementations must return
/// `Ok` with a diff whenever the resolver answered (including NXDOMAIN and
/// empty answers) and reserve `Err` for lookups that produced no answer.
#[async_trait]
pub trait DnsProbe: Send + Sync {
    /// Compare the A records of `domain` with `expected`.
    async fn resolve_ipv4_diff(&self, domain: &str, expected: &[Ipv4Addr])
        -> ProbeResult<DnsDiff>;

    /// Check that `alias_domain` is a CNAME pointing at `target_domain`.
    async fn resolve_cname_diff(
        &self,
        alias_domain: &str,
        target_domain: &str,
    ) -> ProbeResult<DnsDiff>;

    /// Check that `challenge_domain` publishes a TXT record equal to `expected_code`.
    async fn resolve_txt_diff(
        &self,
        challenge_domain: &str,
        expected_code: &str,
    ) -> ProbeResult<DnsDiff>;
}
