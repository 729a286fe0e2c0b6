//! Rescheduler job: restart the verification cycle of failed records
//!
//! Only `verification-failed` is retried. Records that failed after their
//! deadline (`verification-failed-permanently`) stay as they are until a
//! manual restart.

use std::sync::Arc;

use async_trait::async_trait;

use super::{JobTask, TickSummary};
use crate::services::DomainRecordService;
use crate::types::{RecordStatus, StatusScope};

pub struct ReschedulerTask {
    service: Arc<DomainRecordService>,
}

impl ReschedulerTask {
    #[must_use]
    pub fn new(service: Arc<DomainRecordService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl JobTask for ReschedulerTask {
    fn name(&self) -> &'static str {
        "verification-rescheduler"
    }

    async fn run(&self) -> TickSummary {
        let ctx = self.service.context();
        let records = match ctx
            .domain_record_repository
            .find_by_statuses(&StatusScope::only(&[RecordStatus::Failed]), None)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                log::error!("Failed to load failed records: {e}");
                return TickSummary::default();
            }
        };

        let mut summary = TickSummary::default();
        for record in records {
            summary.processed += 1;
            match self.service.reschedule(&record.id).await {
                Ok(saved) => {
                    summary.succeeded += 1;
                    log::debug!("Rescheduled verification of {} ({})", saved.domain, saved.id);
                }
                Err(e) => {
                    summary.failed += 1;
                    if e.is_expected() {
                        log::warn!("Failed to reschedule {} ({}): {e}", record.domain, record.id);
                    } else {
                        log::error!("Failed to reschedule {} ({}): {e}", record.domain, record.id);
                    }
                }
            }
        }
        summary
    }
}
