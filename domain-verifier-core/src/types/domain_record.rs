//! Domain record type definitions

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{RecordStatus, StatusInfo};
use super::verification::Verification;
use crate::error::{CoreError, CoreResult};
use crate::utils::validate_domain;

fn default_enable_www_alias() -> bool {
    true
}

/// A custom domain attached to a project, together with the state of its
/// ownership verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    pub id: String,
    pub project_id: String,
    /// Canonical domain, never with a leading `www.`
    pub domain: String,
    /// Addresses the domain must resolve to (platform-assigned)
    pub ip_addresses: Vec<Ipv4Addr>,
    #[serde(default = "default_enable_www_alias")]
    pub enable_www_alias: bool,
    pub verification: Verification,
    pub status: StatusInfo,
    /// Optimistic-concurrency counter; `0` means "never saved"
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Options accepted when creating a domain record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDomainOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_www_alias: Option<bool>,
}

impl DomainRecord {
    /// Build an unsaved record in status `pending-verification`.
    ///
    /// `domain` must already be canonical (see [`crate::utils::normalize_domain`]).
    #[must_use]
    pub fn new(
        project_id: impl Into<String>,
        domain: impl Into<String>,
        ip_addresses: Vec<Ipv4Addr>,
        enable_www_alias: bool,
        verification: Verification,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            domain: domain.into(),
            ip_addresses,
            enable_www_alias,
            verification,
            status: StatusInfo::new(RecordStatus::Pending, reason, now),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// `www.<domain>`, the alias the CNAME channel checks.
    #[must_use]
    pub fn www_alias(&self) -> String {
        format!("www.{}", self.domain)
    }

    /// `<subdomain>.<domain>`, where the TXT challenge must be published.
    #[must_use]
    pub fn challenge_host(&self) -> String {
        format!("{}.{}", self.verification.subdomain, self.domain)
    }

    /// Set status value and reason together.
    pub fn set_status(&mut self, value: RecordStatus, reason: &str, now: DateTime<Utc>) {
        self.status = StatusInfo::new(value, reason, now);
        self.updated_at = now;
    }

    /// Clear the window, move the deadline and return to `pending-verification`.
    pub fn restart_verification(
        &mut self,
        expires_at: DateTime<Utc>,
        reason: &str,
        now: DateTime<Utc>,
    ) {
        self.verification.reset(expires_at);
        self.set_status(RecordStatus::Pending, reason, now);
    }

    /// Schema check run before every persist.
    pub fn validate(&self, sample_size: usize) -> CoreResult<()> {
        if self.id.trim().is_empty() {
            return Err(CoreError::ValidationError("id is required".to_string()));
        }
        if self.project_id.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "projectId is required".to_string(),
            ));
        }
        validate_domain(&self.domain)?;
        if self.ip_addresses.is_empty() {
            return Err(CoreError::ValidationError(
                "ipAddresses must not be empty".to_string(),
            ));
        }
        if self.verification.code.is_empty() || self.verification.subdomain.is_empty() {
            return Err(CoreError::ValidationError(
                "verification code and subdomain are required".to_string(),
            ));
        }
        if self.verification.results.len() > sample_size {
            return Err(CoreError::ValidationError(format!(
                "verification window holds {} results, more than the sample size {sample_size}",
                self.verification.results.len()
            )));
        }
        Ok(())
    }
}
