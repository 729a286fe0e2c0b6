//! 域名记录管理服务

use std::sync::Arc;

use super::verification_service::{VerificationEngine, VerificationOutcome, MAX_SAVE_ATTEMPTS};
use super::ServiceContext;
use crate::error::{CoreError, CoreResult};
use crate::types::{
    reasons, CreateDomainOptions, DomainRecord, RecordStatus, StatusScope, Verification,
};
use crate::utils::{normalize_domain, strip_www, validate_domain};

/// 域名记录管理服务
///
/// Public operations on domain records. Every write goes through the
/// repository's versioned `save`.
pub struct DomainRecordService {
    ctx: Arc<ServiceContext>,
    engine: VerificationEngine,
}

impl DomainRecordService {
    /// 创建服务实例
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        let engine = VerificationEngine::new(Arc::clone(&ctx));
        Self { ctx, engine }
    }

    #[must_use]
    pub fn context(&self) -> &Arc<ServiceContext> {
        &self.ctx
    }

    #[must_use]
    pub fn engine(&self) -> &VerificationEngine {
        &self.engine
    }

    /// 创建域名记录
    ///
    /// The domain is normalized (a leading `www.` is dropped) and the record
    /// starts in `pending-verification` with a fresh code and deadline.
    pub async fn create(
        &self,
        project_id: &str,
        domain: &str,
        options: CreateDomainOptions,
    ) -> CoreResult<DomainRecord> {
        if project_id.trim().is_empty() {
            return Err(CoreError::invalid_option("projectId", "required"));
        }
        let domain = normalize_domain(domain)?;
        validate_domain(&domain)?;

        let config = &self.ctx.config;
        let record = DomainRecord::new(
            project_id.trim(),
            domain,
            config.expected_ip_addresses.clone(),
            options.enable_www_alias.unwrap_or(true),
            Verification::new(
                config.verification_subdomain.clone(),
                self.ctx.verification_expiry(),
            ),
            reasons::USER_CREATED,
            self.ctx.now(),
        );
        record.validate(config.sample_size)?;

        let saved = self.ctx.domain_record_repository.save(&record).await?;
        log::info!(
            "Created domain record {} for {} (project {})",
            saved.id,
            saved.domain,
            saved.project_id
        );
        Ok(saved)
    }

    /// 执行一次验证
    ///
    /// Publishes `website-deployed` after the save when the record became
    /// active.
    pub async fn verify(&self, record: DomainRecord) -> CoreResult<VerificationOutcome> {
        let outcome = self.engine.verify(record).await?;
        if outcome.activated {
            log::info!(
                "Domain {} is now active (record {})",
                outcome.record.domain,
                outcome.record.id
            );
            self.ctx.publish_activation(&outcome.record).await;
        }
        Ok(outcome)
    }

    pub async fn verify_by_id(&self, id: &str) -> CoreResult<VerificationOutcome> {
        let record = self.get_by_id(id).await?;
        self.verify(record).await
    }

    /// 重新开始验证
    ///
    /// Clears the window, moves the deadline and returns the record to
    /// `pending-verification`. Rejected for removed records.
    pub async fn restart_verification(&self, id: &str) -> CoreResult<DomainRecord> {
        let saved = self
            .update(id, |record, ctx| {
                if record.status.value.is_removed() {
                    return Err(CoreError::invalid_option(
                        "status",
                        format!("cannot restart a record in status {}", record.status.value),
                    ));
                }
                record.restart_verification(
                    ctx.verification_expiry(),
                    reasons::VERIFICATION_RESTARTED,
                    ctx.now(),
                );
                Ok(())
            })
            .await?;
        log::info!("Restarted verification of {} ({})", saved.domain, saved.id);
        Ok(saved)
    }

    /// Automatic retry of a `verification-failed` record.
    ///
    /// Records that left the failed state since they were listed are returned
    /// unchanged.
    pub async fn reschedule(&self, id: &str) -> CoreResult<DomainRecord> {
        self.update(id, |record, ctx| {
            if record.status.value == RecordStatus::Failed {
                record.restart_verification(
                    ctx.verification_expiry(),
                    reasons::AUTOMATICALLY_RESCHEDULED,
                    ctx.now(),
                );
            }
            Ok(())
        })
        .await
    }

    /// 标记删除
    ///
    /// Terminal; the record is kept but never verified again.
    pub async fn schedule_removal(&self, id: &str, reason: Option<&str>) -> CoreResult<DomainRecord> {
        let reason = reason.unwrap_or(reasons::USER_REMOVED);
        let saved = self
            .update(id, |record, ctx| {
                if !record.status.value.is_removed() {
                    record.set_status(RecordStatus::ScheduledForRemoval, reason, ctx.now());
                }
                Ok(())
            })
            .await?;
        log::info!("Scheduled {} ({}) for removal", saved.domain, saved.id);
        Ok(saved)
    }

    pub async fn get_by_id(&self, id: &str) -> CoreResult<DomainRecord> {
        if id.is_empty() {
            return Err(CoreError::invalid_option("id", "required"));
        }
        self.ctx
            .domain_record_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("domainRecord", id))
    }

    /// 按域名查找已激活的记录
    ///
    /// Accepts the `www.` form as well.
    pub async fn get_by_active_domain(&self, domain: &str) -> CoreResult<DomainRecord> {
        let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
        if domain.is_empty() {
            return Err(CoreError::invalid_option("domain", "required"));
        }
        let domain = strip_www(&domain);
        self.ctx
            .domain_record_repository
            .find_active_by_domain(domain)
            .await?
            .ok_or_else(|| CoreError::not_found("domainRecord", domain))
    }

    pub async fn list_project_records(
        &self,
        project_id: &str,
        scope: &StatusScope,
    ) -> CoreResult<Vec<DomainRecord>> {
        if project_id.is_empty() {
            return Err(CoreError::invalid_option("projectId", "required"));
        }
        self.ctx
            .domain_record_repository
            .find_by_project(project_id, scope)
            .await
    }

    /// Versioned read-modify-write, retried on stale versions.
    async fn update<F>(&self, id: &str, mutate: F) -> CoreResult<DomainRecord>
    where
        F: Fn(&mut DomainRecord, &ServiceContext) -> CoreResult<()> + Send + Sync,
    {
        let mut attempt = 1;
        loop {
            let mut record = self.get_by_id(id).await?;
            mutate(&mut record, self.ctx.as_ref())?;
            record.validate(self.ctx.config.sample_size)?;

            match self.ctx.domain_record_repository.save(&record).await {
                Err(e) if e.is_stale_version() && attempt < MAX_SAVE_ATTEMPTS => {
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
