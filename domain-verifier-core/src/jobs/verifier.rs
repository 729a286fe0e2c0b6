//! Verifier job: one probe cycle for every record awaiting verification

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use super::{JobTask, TickSummary};
use crate::services::DomainRecordService;
use crate::types::{RecordStatus, StatusScope};

/// Statuses the verifier picks up. `active` records are never re-verified
/// automatically.
pub const VERIFIER_STATUSES: [RecordStatus; 2] = [RecordStatus::Pending, RecordStatus::Verifying];

pub struct VerifierTask {
    service: Arc<DomainRecordService>,
}

impl VerifierTask {
    #[must_use]
    pub fn new(service: Arc<DomainRecordService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl JobTask for VerifierTask {
    fn name(&self) -> &'static str {
        "domain-verifier"
    }

    async fn run(&self) -> TickSummary {
        let ctx = self.service.context();
        let scope = StatusScope::only(&VERIFIER_STATUSES);

        let records = match ctx
            .domain_record_repository
            .find_by_statuses(&scope, Some(ctx.config.verification_batch_cap))
            .await
        {
            Ok(records) => records,
            Err(e) => {
                log::error!("Failed to load records awaiting verification: {e}");
                return TickSummary::default();
            }
        };

        let service = &self.service;
        let outcomes: Vec<_> = stream::iter(records)
            .map(|record| async move {
                let id = record.id.clone();
                let domain = record.domain.clone();
                (id, domain, service.verify(record).await)
            })
            .buffer_unordered(ctx.config.verification_concurrency)
            .collect()
            .await;

        let mut summary = TickSummary::default();
        for (id, domain, outcome) in outcomes {
            summary.processed += 1;
            match outcome {
                Ok(outcome) => {
                    summary.succeeded += 1;
                    if outcome.activated {
                        summary.activated += 1;
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    if e.is_expected() {
                        log::warn!("Verification of {domain} ({id}) failed: {e}");
                    } else {
                        log::error!("Verification of {domain} ({id}) failed: {e}");
                    }
                }
            }
        }
        summary
    }
}
