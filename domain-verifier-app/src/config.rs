//! Configuration file
//!
//! ```toml
//! databasePath = "data/domain-records.db"
//! nameservers = ["1.1.1.1", "8.8.8.8"]
//!
//! [verification]
//! expectedIpAddresses = ["203.0.113.10"]
//! sampleSize = 10
//! activationThreshold = 0.6
//! verificationExpiresIn = "48h"
//! verifierSchedule = "every 5m"
//! reschedulerSchedule = "daily 00:00"
//! ```

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use domain_verifier_core::config::VerificationConfig;
use domain_verifier_core::error::{CoreError, CoreResult};

/// Top-level configuration of a verifier process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// `SQLite` database file; records are kept in memory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    /// Resolvers for the DNS probe; the system configuration when empty
    pub nameservers: Vec<IpAddr>,
    pub verification: VerificationConfig,
}

impl AppConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| CoreError::ConfigError(format!("Failed to parse configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration file at `path`.
    ///
    /// A relative `databasePath` is resolved against the directory of the
    /// configuration file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&raw)?;

        if let (Some(db_path), Some(dir)) = (config.database_path.as_mut(), path.parent()) {
            if db_path.is_relative() {
                *db_path = dir.join(&*db_path);
            }
        }

        log::debug!(
            "Loaded configuration from {}: database={:?}, nameservers={:?}, sampleSize={}, verifier={}, rescheduler={}",
            path.display(),
            config.database_path,
            config.nameservers,
            config.verification.sample_size,
            config.verification.verifier_schedule,
            config.verification.rescheduler_schedule
        );
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.verification.validate()
    }
}
