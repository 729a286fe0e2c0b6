//! Outbound event payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain_record::DomainRecord;

/// Emitted after a record has been persisted in status `active`.
///
/// Delivery is at-least-once; consumers must treat repeated events for the
/// same `record_id` as idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteDeployedEvent {
    pub record_id: String,
    pub project_id: String,
    pub domain: String,
    pub enable_www_alias: bool,
    pub activated_at: DateTime<Utc>,
}

impl WebsiteDeployedEvent {
    pub const NAME: &'static str = "website-deployed";

    #[must_use]
    pub fn from_record(record: &DomainRecord) -> Self {
        Self {
            record_id: record.id.clone(),
            project_id: record.project_id.clone(),
            domain: record.domain.clone(),
            enable_www_alias: record.enable_www_alias,
            activated_at: record.status.updated_at,
        }
    }
}
