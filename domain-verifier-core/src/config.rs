//! Verification settings

use std::net::Ipv4Addr;
use std::time::Duration;

use domain_verifier_probe::DEFAULT_PROBE_TIMEOUT;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::jobs::JobSchedule;
use crate::types::DEFAULT_VERIFICATION_SUBDOMAIN;
use crate::utils::{duration, validate_domain};

/// Upper bound for `verificationExpiresIn`.
pub const MAX_VERIFICATION_EXPIRES_IN: Duration = Duration::from_secs(365 * 86_400);

/// Tunables for the verification engine and its periodic jobs.
///
/// Every field has a default except `expected_ip_addresses`, which is
/// platform-specific and must be set; [`validate`](Self::validate) rejects an
/// empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationConfig {
    /// Window size; a decision is only taken once the window is full
    pub sample_size: usize,
    /// Minimum per-channel success ratio for activation
    pub activation_threshold: f64,
    /// Time a verification cycle may take before failures become permanent
    #[serde(with = "duration")]
    pub verification_expires_in: Duration,
    pub verifier_schedule: JobSchedule,
    pub rescheduler_schedule: JobSchedule,
    /// Records picked up per verifier tick
    pub verification_batch_cap: u64,
    /// Records verified in parallel within one tick
    pub verification_concurrency: usize,
    /// Upper bound for a single DNS lookup
    #[serde(with = "duration")]
    pub probe_timeout: Duration,
    /// Addresses assigned to every new record
    pub expected_ip_addresses: Vec<Ipv4Addr>,
    pub verification_subdomain: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            sample_size: 10,
            activation_threshold: 0.6,
            verification_expires_in: Duration::from_secs(48 * 3600),
            verifier_schedule: JobSchedule::DEFAULT_VERIFIER,
            rescheduler_schedule: JobSchedule::DEFAULT_RESCHEDULER,
            verification_batch_cap: 30,
            verification_concurrency: 8,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            expected_ip_addresses: Vec::new(),
            verification_subdomain: DEFAULT_VERIFICATION_SUBDOMAIN.to_string(),
        }
    }
}

impl VerificationConfig {
    /// Startup check; any error here is fatal.
    pub fn validate(&self) -> CoreResult<()> {
        if self.sample_size == 0 {
            return Err(CoreError::ConfigError(
                "sampleSize must be at least 1".to_string(),
            ));
        }
        if !(self.activation_threshold > 0.0 && self.activation_threshold <= 1.0) {
            return Err(CoreError::ConfigError(format!(
                "activationThreshold must be in (0, 1], got {}",
                self.activation_threshold
            )));
        }
        if self.verification_expires_in.is_zero() {
            return Err(CoreError::ConfigError(
                "verificationExpiresIn must be positive".to_string(),
            ));
        }
        if self.verification_expires_in > MAX_VERIFICATION_EXPIRES_IN {
            return Err(CoreError::ConfigError(format!(
                "verificationExpiresIn must not exceed {}, got {}",
                humantime::format_duration(MAX_VERIFICATION_EXPIRES_IN),
                humantime::format_duration(self.verification_expires_in)
            )));
        }
        if self.verification_batch_cap == 0 {
            return Err(CoreError::ConfigError(
                "verificationBatchCap must be at least 1".to_string(),
            ));
        }
        if self.verification_concurrency == 0 {
            return Err(CoreError::ConfigError(
                "verificationConcurrency must be at least 1".to_string(),
            ));
        }
        if self.probe_timeout.is_zero() {
            return Err(CoreError::ConfigError(
                "probeTimeout must be positive".to_string(),
            ));
        }
        if self.expected_ip_addresses.is_empty() {
            return Err(CoreError::ConfigError(
                "expectedIpAddresses is required and must not be empty".to_string(),
            ));
        }
        // the subdomain must form a valid host together with any domain
        validate_domain(&format!("{}.example.com", self.verification_subdomain)).map_err(
            |_| {
                CoreError::ConfigError(format!(
                    "verificationSubdomain '{}' is not a valid DNS label",
                    self.verification_subdomain
                ))
            },
        )?;
        Ok(())
    }

    /// `verification_expires_in` as a chrono duration, whole seconds.
    ///
    /// Values above [`MAX_VERIFICATION_EXPIRES_IN`] are rejected by
    /// [`validate`](Self::validate) and clamped here.
    #[must_use]
    pub fn verification_ttl(&self) -> chrono::Duration {
        let secs = self
            .verification_expires_in
            .min(MAX_VERIFICATION_EXPIRES_IN)
            .as_secs();
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
    }
}
