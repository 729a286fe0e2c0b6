//! 业务逻辑服务层

mod domain_record_service;
mod scoring;
mod transition;
mod verification_service;

pub use domain_record_service::DomainRecordService;
pub use scoring::{compute_scores, VerificationScores};
pub use transition::{Transition, TransitionPolicy};
pub use verification_service::{VerificationEngine, VerificationOutcome, MAX_SAVE_ATTEMPTS};

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::VerificationConfig;
use crate::traits::{Clock, DnsProbe, DomainRecordRepository, WebsiteEventPublisher};
use crate::types::{DomainRecord, WebsiteDeployedEvent};

/// 服务上下文 - 持有所有依赖
///
/// 平台层需要创建此上下文，并注入平台特定的存储和 DNS 实现。
pub struct ServiceContext {
    /// 域名记录仓库
    pub domain_record_repository: Arc<dyn DomainRecordRepository>,
    /// DNS 探测
    pub dns_probe: Arc<dyn DnsProbe>,
    /// 部署事件发布
    pub event_publisher: Arc<dyn WebsiteEventPublisher>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<VerificationConfig>,
}

impl ServiceContext {
    /// 创建服务上下文
    #[must_use]
    pub fn new(
        domain_record_repository: Arc<dyn DomainRecordRepository>,
        dns_probe: Arc<dyn DnsProbe>,
        event_publisher: Arc<dyn WebsiteEventPublisher>,
        clock: Arc<dyn Clock>,
        config: Arc<VerificationConfig>,
    ) -> Self {
        Self {
            domain_record_repository,
            dns_probe,
            event_publisher,
            clock,
            config,
        }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Deadline for a verification cycle starting now.
    #[must_use]
    pub fn verification_expiry(&self) -> DateTime<Utc> {
        self.now() + self.config.verification_ttl()
    }

    /// 发布 website-deployed 事件
    ///
    /// Fire-and-forget: the record is already saved, so a failure is only logged.
    pub async fn publish_activation(&self, record: &DomainRecord) {
        let event = WebsiteDeployedEvent::from_record(record);
        match self.event_publisher.publish_website_deployed(&event).await {
            Ok(()) => log::info!(
                "Published {} for {} (record {})",
                WebsiteDeployedEvent::NAME,
                event.domain,
                event.record_id
            ),
            Err(e) => log::error!(
                "Failed to publish {} for record {}: {e}",
                WebsiteDeployedEvent::NAME,
                event.record_id
            ),
        }
    }
}
