//! Raw record lookups.
//!
//! Each function returns the normalised record values for one name. An
//! NXDOMAIN or NODATA answer yields an empty list; anything else the
//! resolver reports is a [`ProbeError::Resolver`].

use hickory_resolver::{proto::rr::RecordType, ResolveError, TokioResolver};

use crate::error::{ProbeError, ProbeResult};

/// Lower-case a DNS name and drop the root label.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn empty_or_error(host: &str, err: &ResolveError) -> ProbeResult<Vec<String>> {
    if err.is_no_records_found() {
        log::debug!("No records for {host}: {err}");
        return Ok(Vec::new());
    }
    Err(ProbeError::Resolver {
        host: host.to_string(),
        detail: err.to_string(),
    })
}

pub(crate) async fn lookup_ipv4(resolver: &TokioResolver, host: &str) -> ProbeResult<Vec<String>> {
    match resolver.ipv4_lookup(host).await {
        Ok(response) => Ok(response.iter().map(|a| a.0.to_string()).collect()),
        Err(e) => empty_or_error(host, &e),
    }
}

pub(crate) async fn lookup_cname(
    resolver: &TokioResolver,
    host: &str,
) -> ProbeResult<Vec<String>> {
    match resolver.lookup(host, RecordType::CNAME).await {
        Ok(response) => Ok(response
            .record_iter()
            .filter_map(|record| record.data().as_cname())
            .map(|cname| normalize_name(&cname.0.to_string()))
            .collect()),
        Err(e) => empty_or_error(host, &e),
    }
}

pub(crate) async fn lookup_txt(resolver: &TokioResolver, host: &str) -> ProbeResult<Vec<String>> {
    match resolver.txt_lookup(host).await {
        Ok(response) => Ok(response
            .iter()
            .map(|txt| {
                txt.iter()
                    .map(|data| String::from_utf8_lossy(data).to_string())
                    .collect::<String>()
            })
            .collect()),
        Err(e) => empty_or_error(host, &e),
    }
}
