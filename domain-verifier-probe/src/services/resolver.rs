//! Resolver construction shared by the probe implementations.

use std::net::IpAddr;
use std::time::Duration;

use hickory_resolver::{
    config::{NameServerConfigGroup, ResolverConfig, ResolverOpts},
    name_server::TokioConnectionProvider,
    TokioResolver,
};

/// Deduplicate nameserver IP addresses from a resolver configuration.
pub(crate) fn dedup_ips(config: &ResolverConfig) -> Vec<String> {
    let mut ips: Vec<String> = Vec::new();
    for ns in config.name_servers() {
        let ip = ns.socket_addr.ip().to_string();
        if !ips.contains(&ip) {
            ips.push(ip);
        }
    }
    ips
}

/// Resolver options for verification probes: no answer cache, per-lookup timeout.
fn probe_options(timeout: Duration) -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    opts.timeout = timeout;
    opts.attempts = 2;
    opts.cache_size = 0;
    opts
}

/// Build a resolver that targets the given nameservers, or the host system
/// configuration when `nameservers` is empty.
pub(crate) fn build_resolver(nameservers: &[IpAddr], timeout: Duration) -> TokioResolver {
    if !nameservers.is_empty() {
        let config = ResolverConfig::from_parts(
            None,
            vec![],
            NameServerConfigGroup::from_ips_clear(nameservers, 53, true),
        );
        let provider = TokioConnectionProvider::default();
        return TokioResolver::builder_with_config(config, provider)
            .with_options(probe_options(timeout))
            .build();
    }

    build_system_resolver(timeout)
}

/// Build a resolver using the host system DNS configuration (with fallback).
fn build_system_resolver(timeout: Duration) -> TokioResolver {
    #[cfg(any(unix, target_os = "windows"))]
    {
        match TokioResolver::builder_tokio() {
            Ok(mut builder) => {
                *builder.options_mut() = probe_options(timeout);
                return builder.build();
            }
            Err(e) => {
                log::warn!(
                    "Failed to load system DNS configuration, falling back to defaults: {e}"
                );
            }
        }
    }

    let config = ResolverConfig::default();
    log::info!("Using fallback nameservers: {}", dedup_ips(&config).join(", "));
    TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
        .with_options(probe_options(timeout))
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dedup_ips_removes_duplicates() {
        let ip: IpAddr = "1.2.3.4".parse().unwrap();
        let ns_group = NameServerConfigGroup::from_ips_clear(&[ip, ip], 53, true);
        let config = ResolverConfig::from_parts(None, vec![], ns_group);
        let ips = dedup_ips(&config);
        assert_eq!(ips.iter().filter(|&x| x == "1.2.3.4").count(), 1);
    }

    #[test]
    fn dedup_ips_empty_config() {
        let config = ResolverConfig::from_parts(None, vec![], NameServerConfigGroup::new());
        assert!(dedup_ips(&config).is_empty());
    }

    #[test]
    fn probe_options_disable_cache() {
        let opts = probe_options(Duration::from_secs(3));
        assert_eq!(opts.cache_size, 0);
        assert_eq!(opts.timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn build_resolver_for_explicit_nameserver() {
        let ip: IpAddr = "8.8.8.8".parse().unwrap();
        let _resolver = build_resolver(&[ip], Duration::from_secs(2));
    }
}
