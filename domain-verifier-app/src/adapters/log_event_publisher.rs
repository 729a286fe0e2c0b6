//! Event publisher that writes `website-deployed` events to the log.

use async_trait::async_trait;

use domain_verifier_core::error::{CoreError, CoreResult};
use domain_verifier_core::traits::WebsiteEventPublisher;
use domain_verifier_core::types::WebsiteDeployedEvent;

/// Emits each event as a single JSON log line under the `events` target.
///
/// Used when no message bus is configured; a log shipper can pick the lines
/// up from there.
pub struct LogEventPublisher;

#[async_trait]
impl WebsiteEventPublisher for LogEventPublisher {
    async fn publish_website_deployed(&self, event: &WebsiteDeployedEvent) -> CoreResult<()> {
        let payload = serde_json::to_string(event)
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;
        log::info!(target: "events", "{} {payload}", WebsiteDeployedEvent::NAME);
        Ok(())
    }
}
