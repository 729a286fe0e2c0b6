//! Probe error type.

use serde::Serialize;
use thiserror::Error;

/// Resolver-level failure of a single DNS probe.
///
/// A probe that reaches a resolver and learns that the expected records are
/// absent is **not** an error: it returns a [`DnsDiff`](crate::DnsDiff) with a
/// non-empty `missing` set. These variants cover the cases where no answer
/// could be obtained at all.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum ProbeError {
    /// The lookup did not complete within the configured timeout.
    #[error("DNS lookup for {host} timed out after {timeout_ms}ms")]
    Timeout { host: String, timeout_ms: u64 },

    /// The resolver failed (SERVFAIL, refused, socket error, ...).
    #[error("DNS lookup for {host} failed: {detail}")]
    Resolver { host: String, detail: String },

    /// The probe was asked to resolve something that is not a host name.
    #[error("Invalid probe input: {0}")]
    InvalidInput(String),
}

impl ProbeError {
    /// Transient failures are worth retrying on the next tick.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Resolver { .. })
    }
}

/// Probe Result type alias
pub type ProbeResult<T> = std::result::Result<T, ProbeError>;
