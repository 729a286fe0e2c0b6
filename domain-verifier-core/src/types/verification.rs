//! Verification state embedded in a domain record

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use domain_verifier_probe::DnsDiff;

/// Default challenge host label.
pub const DEFAULT_VERIFICATION_SUBDOMAIN: &str = "habemus-verify";

/// The only verification method: a TXT record on a challenge subdomain.
pub const VERIFICATION_METHOD_DNS_SUBDOMAIN: &str = "DNSSubdomain";

/// Outcome of one probe cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub cname_diff: DnsDiff,
    pub txt_diff: DnsDiff,
    pub ipv4_diff: DnsDiff,
    pub checked_at: DateTime<Utc>,
}

impl VerificationResult {
    #[must_use]
    pub fn cname_ok(&self) -> bool {
        self.cname_diff.is_satisfied()
    }

    #[must_use]
    pub fn txt_ok(&self) -> bool {
        self.txt_diff.is_satisfied()
    }

    /// IPv4 requires an exact set match, a superset does not count.
    #[must_use]
    pub fn ipv4_ok(&self) -> bool {
        self.ipv4_diff.is_exact()
    }
}

/// Bounded, most-recent-first window of probe results.
///
/// The capacity is not stored: it comes from configuration and is passed to
/// [`push`](Self::push), which also trims a window left over from a larger
/// sample size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationWindow(VecDeque<VerificationResult>);

impl VerificationWindow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `result` at the head, evicting from the tail so that at most
    /// `capacity` entries remain.
    pub fn push(&mut self, result: VerificationResult, capacity: usize) {
        let capacity = capacity.max(1);
        self.0.truncate(capacity - 1);
        self.0.push_front(result);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most recent result.
    #[must_use]
    pub fn latest(&self) -> Option<&VerificationResult> {
        self.0.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VerificationResult> {
        self.0.iter()
    }
}

impl FromIterator<VerificationResult> for VerificationWindow {
    fn from_iter<I: IntoIterator<Item = VerificationResult>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Score and activity of a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResult {
    pub score: f64,
    pub active: bool,
}

/// Snapshot derived from the window on the last probe cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialResults {
    pub cname: ChannelResult,
    pub txt: ChannelResult,
    pub ipv4: ChannelResult,
}

impl PartialResults {
    /// All three channels are active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cname.active && self.txt.active && self.ipv4.active
    }
}

/// Verification data of a domain record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub subdomain: String,
    pub code: String,
    pub method: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub results: VerificationWindow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_partial_results: Option<PartialResults>,
    /// Last verification cycle, whether or not it produced a sample
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl Verification {
    /// Fresh verification state with a random code.
    #[must_use]
    pub fn new(subdomain: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            subdomain: subdomain.into(),
            code: generate_code(),
            method: VERIFICATION_METHOD_DNS_SUBDOMAIN.to_string(),
            expires_at,
            results: VerificationWindow::new(),
            computed_partial_results: None,
            last_attempt_at: None,
        }
    }

    /// Drop all samples and move the deadline. The code is kept so the
    /// tenant's TXT record stays valid.
    pub fn reset(&mut self, expires_at: DateTime<Utc>) {
        self.results.clear();
        self.computed_partial_results = None;
        self.last_attempt_at = None;
        self.expires_at = expires_at;
    }
}

/// Random opaque token: a v4 UUID without dashes.
#[must_use]
pub fn generate_code() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
