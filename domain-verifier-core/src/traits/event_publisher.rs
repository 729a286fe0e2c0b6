//! Outbound event channel abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::WebsiteDeployedEvent;

/// Website event publisher Trait
///
/// Called after a record has been saved in status `active`. Failures are
/// logged by the caller and never roll the record back.
#[async_trait]
pub trait WebsiteEventPublisher: Send + Sync {
    async fn publish_website_deployed(&self, event: &WebsiteDeployedEvent) -> CoreResult<()>;
}

/// Publisher that drops every event.
pub struct NoopWebsiteEventPublisher;

#[async_trait]
impl WebsiteEventPublisher for NoopWebsiteEventPublisher {
    async fn publish_website_deployed(&self, _event: &WebsiteDeployedEvent) -> CoreResult<()> {
        Ok(())
    }
}
