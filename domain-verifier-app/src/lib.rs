//! Application bootstrap for the domain verifier.
//!
//! Provides `AppState` (service container), `AppStateBuilder` (adapter
//! injection), `AppConfig` (configuration file) and the storage adapters.

pub mod adapters;
pub mod config;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use domain_verifier_core::config::VerificationConfig;
use domain_verifier_core::error::{CoreError, CoreResult};
use domain_verifier_core::jobs::VerificationJobs;
use domain_verifier_core::services::{DomainRecordService, ServiceContext};
use domain_verifier_core::traits::{
    Clock, DnsProbe, DomainRecordRepository, InMemoryDomainRecordRepository,
    NoopWebsiteEventPublisher, SystemClock, WebsiteEventPublisher,
};

pub use config::AppConfig;

/// Application state.
///
/// Holds the `ServiceContext`, the domain record service and the periodic
/// jobs. Every frontend constructs this once at startup via `AppStateBuilder`.
pub struct AppState {
    /// Service context (holds all adapters)
    pub ctx: Arc<ServiceContext>,
    /// Domain record service
    pub domain_record_service: Arc<DomainRecordService>,
    /// Verifier and rescheduler
    pub jobs: VerificationJobs,
    /// Whether the periodic jobs are running
    pub jobs_started: AtomicBool,
}

impl AppState {
    /// Start the verifier and rescheduler timers.
    pub async fn start_jobs(&self) {
        if self.jobs_started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.jobs.start().await;
        log::info!(
            "Verification jobs started (verifier: {}, rescheduler: {})",
            self.jobs.verifier.schedule(),
            self.jobs.rescheduler.schedule()
        );
    }

    /// Stop both timers; in-flight ticks are abandoned.
    pub async fn shutdown(&self) {
        if !self.jobs_started.swap(false, Ordering::SeqCst) {
            return;
        }
        self.jobs.stop().await;
        log::info!("Verification jobs stopped");
    }
}

/// Builder for constructing `AppState` with platform-specific adapters.
///
/// # Required
/// - `config`: verification settings, validated in `build`
/// - `dns_probe`: how DNS is queried
///
/// # Optional
/// - `domain_record_repository`: defaults to `InMemoryDomainRecordRepository`
/// - `event_publisher`: defaults to `NoopWebsiteEventPublisher`
/// - `clock`: defaults to `SystemClock`
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<VerificationConfig>,
    domain_record_repository: Option<Arc<dyn DomainRecordRepository>>,
    dns_probe: Option<Arc<dyn DnsProbe>>,
    event_publisher: Option<Arc<dyn WebsiteEventPublisher>>,
    clock: Option<Arc<dyn Clock>>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: VerificationConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn domain_record_repository(mut self, repo: Arc<dyn DomainRecordRepository>) -> Self {
        self.domain_record_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn dns_probe(mut self, probe: Arc<dyn DnsProbe>) -> Self {
        self.dns_probe = Some(probe);
        self
    }

    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn WebsiteEventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `CoreError::ConfigError` if the configuration is missing or
    /// invalid, and `CoreError::ValidationError` if the DNS probe is missing.
    pub fn build(self) -> CoreResult<AppState> {
        let config = self
            .config
            .ok_or_else(|| CoreError::ConfigError("verification config is required".to_string()))?;
        config.validate()?;

        let dns_probe = self
            .dns_probe
            .ok_or_else(|| CoreError::ValidationError("dns_probe is required".to_string()))?;
        let domain_record_repository = self
            .domain_record_repository
            .unwrap_or_else(|| Arc::new(InMemoryDomainRecordRepository::new()));
        let event_publisher = self
            .event_publisher
            .unwrap_or_else(|| Arc::new(NoopWebsiteEventPublisher));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let ctx = Arc::new(ServiceContext::new(
            domain_record_repository,
            dns_probe,
            event_publisher,
            clock,
            Arc::new(config),
        ));

        let domain_record_service = Arc::new(DomainRecordService::new(Arc::clone(&ctx)));
        let jobs = VerificationJobs::new(Arc::clone(&domain_record_service));

        Ok(AppState {
            ctx,
            domain_record_service,
            jobs,
            jobs_started: AtomicBool::new(false),
        })
    }
}
