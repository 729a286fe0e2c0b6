//! Domain record lifecycle status

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a domain record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    #[serde(rename = "pending-verification")]
    Pending,
    #[serde(rename = "verifying")]
    Verifying,
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "verification-failed")]
    Failed,
    #[serde(rename = "verification-failed-permanently")]
    FailedPermanently,
    #[serde(rename = "scheduled-for-removal")]
    ScheduledForRemoval,
}

impl RecordStatus {
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Verifying,
        Self::Active,
        Self::Failed,
        Self::FailedPermanently,
        Self::ScheduledForRemoval,
    ];

    /// Wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending-verification",
            Self::Verifying => "verifying",
            Self::Active => "active",
            Self::Failed => "verification-failed",
            Self::FailedPermanently => "verification-failed-permanently",
            Self::ScheduledForRemoval => "scheduled-for-removal",
        }
    }

    /// Removed records never re-enter the verification cycle.
    #[must_use]
    pub const fn is_removed(self) -> bool {
        matches!(self, Self::ScheduledForRemoval)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown record status: {s}"))
    }
}

/// Status reason codes
pub mod reasons {
    pub const USER_CREATED: &str = "UserCreated";
    pub const VERIFICATION_IN_PROCESS: &str = "VerificationInProcess";
    pub const VERIFICATION_SUCCESS: &str = "VerificationSuccess";
    pub const VERIFICATION_FAILED: &str = "VerificationFailed";
    pub const VERIFICATION_EXPIRED: &str = "VerificationExpired";
    pub const AUTOMATICALLY_RESCHEDULED: &str = "AutomaticallyRescheduled";
    pub const VERIFICATION_RESTARTED: &str = "VerificationRestarted";
    pub const USER_REMOVED: &str = "UserRemoved";
}

/// Current status plus the reason for the last transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub value: RecordStatus,
    pub reason: String,
    pub updated_at: DateTime<Utc>,
}

impl StatusInfo {
    #[must_use]
    pub fn new(value: RecordStatus, reason: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            value,
            reason: reason.into(),
            updated_at,
        }
    }
}

/// Status filter for store queries.
///
/// An empty `include` list means "every status"; `exclude` is applied
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusScope {
    #[serde(default)]
    pub include: Vec<RecordStatus>,
    #[serde(default)]
    pub exclude: Vec<RecordStatus>,
}

impl StatusScope {
    /// No filtering.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Only the given statuses.
    #[must_use]
    pub fn only(statuses: &[RecordStatus]) -> Self {
        Self {
            include: statuses.to_vec(),
            exclude: Vec::new(),
        }
    }

    /// Everything except the given statuses.
    #[must_use]
    pub fn excluding(statuses: &[RecordStatus]) -> Self {
        Self {
            include: Vec::new(),
            exclude: statuses.to_vec(),
        }
    }

    #[must_use]
    pub fn matches(&self, status: RecordStatus) -> bool {
        (self.include.is_empty() || self.include.contains(&status))
            && !self.exclude.contains(&status)
    }

    /// Concrete list of statuses this scope admits.
    #[must_use]
    pub fn statuses(&self) -> Vec<RecordStatus> {
        RecordStatus::ALL
            .into_iter()
            .filter(|s| self.matches(*s))
            .collect()
    }
}
