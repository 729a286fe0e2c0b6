//! 测试辅助模块
//!
//! 提供 mock 实现和便捷的测试工厂方法。

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::RwLock;

use domain_verifier_probe::{DnsDiff, ProbeError, ProbeResult};

use crate::config::VerificationConfig;
use crate::error::{CoreError, CoreResult};
use crate::services::{DomainRecordService, ServiceContext, VerificationEngine};
use crate::traits::{Clock, DnsProbe, InMemoryDomainRecordRepository, WebsiteEventPublisher};
use crate::types::{
    reasons, DomainRecord, Verification, VerificationResult, WebsiteDeployedEvent,
    DEFAULT_VERIFICATION_SUBDOMAIN,
};

pub const TEST_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

// ===== MockDnsProbe =====

/// DNS zone held in memory. Unknown hosts answer with an empty record set.
#[derive(Default)]
pub struct MockDnsProbe {
    a: RwLock<HashMap<String, Vec<String>>>,
    cname: RwLock<HashMap<String, Vec<String>>>,
    txt: RwLock<HashMap<String, Vec<String>>>,
    failures: RwLock<HashMap<String, ProbeError>>,
    calls: AtomicUsize,
}

impl MockDnsProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_a(&self, host: &str, ips: &[Ipv4Addr]) {
        self.a.write().await.insert(
            host.to_string(),
            ips.iter().map(ToString::to_string).collect(),
        );
    }

    pub async fn set_cname(&self, alias: &str, target: &str) {
        self.cname
            .write()
            .await
            .insert(alias.to_string(), vec![target.to_string()]);
    }

    pub async fn set_txt(&self, host: &str, values: &[&str]) {
        self.txt.write().await.insert(
            host.to_string(),
            values.iter().map(ToString::to_string).collect(),
        );
    }

    /// Publish every record `record` is checked against.
    pub async fn publish_record(&self, record: &DomainRecord) {
        self.set_a(&record.domain, &record.ip_addresses).await;
        self.set_cname(&record.www_alias(), &record.domain).await;
        self.set_txt(&record.challenge_host(), &[record.verification.code.as_str()])
            .await;
    }

    /// Every lookup of `host` fails with `err`.
    pub async fn fail_host(&self, host: &str, err: ProbeError) {
        self.failures.write().await.insert(host.to_string(), err);
    }

    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(
        &self,
        zone: &RwLock<HashMap<String, Vec<String>>>,
        host: &str,
    ) -> ProbeResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failures.read().await.get(host) {
            return Err(err.clone());
        }
        Ok(zone.read().await.get(host).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl DnsProbe for MockDnsProbe {
    async fn resolve_ipv4_diff(&self, domain: &str, expected: &[Ipv4Addr]) -> ProbeResult<DnsDiff> {
        let actual = self.answer(&self.a, domain).await?;
        let expected: Vec<String> = expected.iter().map(ToString::to_string).collect();
        Ok(DnsDiff::compute(&expected, &actual))
    }

    async fn resolve_cname_diff(
        &self,
        alias_domain: &str,
        target_domain: &str,
    ) -> ProbeResult<DnsDiff> {
        let actual = self.answer(&self.cname, alias_domain).await?;
        Ok(DnsDiff::compute(&[target_domain], &actual))
    }

    async fn resolve_txt_diff(
        &self,
        challenge_domain: &str,
        expected_code: &str,
    ) -> ProbeResult<DnsDiff> {
        let actual = self.answer(&self.txt, challenge_domain).await?;
        Ok(DnsDiff::compute(&[expected_code], &actual))
    }
}

// ===== RecordingEventPublisher =====

#[derive(Default)]
pub struct RecordingEventPublisher {
    events: RwLock<Vec<WebsiteDeployedEvent>>,
    failing: AtomicBool,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn events(&self) -> Vec<WebsiteDeployedEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl WebsiteEventPublisher for RecordingEventPublisher {
    async fn publish_website_deployed(&self, event: &WebsiteDeployedEvent) -> CoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CoreError::StorageError("event bus unavailable".to_string()));
        }
        self.events.write().await.push(event.clone());
        Ok(())
    }
}

// ===== FixedClock =====

/// Clock that only moves when told to.
pub struct FixedClock {
    now: std::sync::RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::RwLock::new(now),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.write().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap()
    }
}

// ===== Factories =====

pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn test_config(sample_size: usize) -> VerificationConfig {
    VerificationConfig {
        sample_size,
        expected_ip_addresses: vec![TEST_IP],
        ..VerificationConfig::default()
    }
}

/// Unsaved pending record for `domain`.
pub fn test_record(domain: &str, expires_at: DateTime<Utc>) -> DomainRecord {
    DomainRecord::new(
        "project-1",
        domain,
        vec![TEST_IP],
        true,
        Verification::new(DEFAULT_VERIFICATION_SUBDOMAIN, expires_at),
        reasons::USER_CREATED,
        test_now(),
    )
}

/// Sample where every channel matches `record`.
pub fn passing_result(record: &DomainRecord, now: DateTime<Utc>) -> VerificationResult {
    let ips: Vec<String> = record.ip_addresses.iter().map(ToString::to_string).collect();
    VerificationResult {
        cname_diff: DnsDiff::compute(&[record.domain.as_str()], &[record.domain.as_str()]),
        txt_diff: DnsDiff::compute(
            &[record.verification.code.as_str()],
            &[record.verification.code.as_str()],
        ),
        ipv4_diff: DnsDiff::compute(&ips, &ips),
        checked_at: now,
    }
}

/// Sample where only the TXT challenge is missing.
pub fn failing_txt_result(record: &DomainRecord, now: DateTime<Utc>) -> VerificationResult {
    let mut result = passing_result(record, now);
    let empty: [&str; 0] = [];
    result.txt_diff = DnsDiff::compute(&[record.verification.code.as_str()], &empty);
    result
}

/// Every collaborator of a [`ServiceContext`], with handles to the mocks.
pub struct TestHarness {
    pub ctx: Arc<ServiceContext>,
    pub repository: Arc<InMemoryDomainRecordRepository>,
    pub probe: Arc<MockDnsProbe>,
    pub publisher: Arc<RecordingEventPublisher>,
    pub clock: Arc<FixedClock>,
}

impl TestHarness {
    pub fn engine(&self) -> VerificationEngine {
        VerificationEngine::new(Arc::clone(&self.ctx))
    }

    pub fn service(&self) -> DomainRecordService {
        DomainRecordService::new(Arc::clone(&self.ctx))
    }
}

pub fn test_context(sample_size: usize) -> TestHarness {
    test_context_with(test_config(sample_size))
}

pub fn test_context_with(config: VerificationConfig) -> TestHarness {
    let repository = Arc::new(InMemoryDomainRecordRepository::new());
    let probe = Arc::new(MockDnsProbe::new());
    let publisher = Arc::new(RecordingEventPublisher::new());
    let clock = Arc::new(FixedClock::new(test_now()));

    let ctx = Arc::new(ServiceContext::new(
        repository.clone(),
        probe.clone(),
        publisher.clone(),
        clock.clone(),
        Arc::new(config),
    ));

    TestHarness {
        ctx,
        repository,
        probe,
        publisher,
        clock,
    }
}
