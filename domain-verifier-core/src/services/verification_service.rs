//! Verification engine: one probe cycle for one record

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::transition::TransitionPolicy;
use super::ServiceContext;
use crate::error::{ConflictKind, CoreError, CoreResult};
use crate::types::{DomainRecord, RecordStatus, VerificationResult};

/// Saves attempted per sample before a stale-version conflict is surfaced.
pub const MAX_SAVE_ATTEMPTS: usize = 3;

/// What a verification cycle did to a record.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    /// The record as persisted
    pub record: DomainRecord,
    /// Status of the record the sample was applied to
    pub previous_status: RecordStatus,
    /// The cycle moved the record into `active`
    pub activated: bool,
}

/// Verification engine
///
/// Probes DNS for a record, appends the sample to its window, re-evaluates
/// the status and saves. Does not publish events; see
/// [`DomainRecordService`](super::DomainRecordService).
pub struct VerificationEngine {
    ctx: Arc<ServiceContext>,
    policy: TransitionPolicy,
}

impl VerificationEngine {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        let policy = TransitionPolicy::from_config(&ctx.config);
        Self { ctx, policy }
    }

    /// Run a full cycle for `record`.
    ///
    /// On a probe failure no window slot is consumed and the status is kept;
    /// only `last_attempt_at` is stored. A stale-version conflict reloads the
    /// record and re-applies the same sample.
    pub async fn verify(&self, record: DomainRecord) -> CoreResult<VerificationOutcome> {
        Self::check_reference(&record)?;

        let sample = match self.probe(&record).await {
            Ok(sample) => sample,
            Err(e) => {
                self.note_attempt(record, self.ctx.now()).await;
                return Err(e);
            }
        };

        let mut current = record;
        let mut attempt = 1;
        loop {
            let previous_status = current.status.value;
            let mut updated = current.clone();
            self.apply_sample(&mut updated, sample.clone(), self.ctx.now());
            updated.validate(self.ctx.config.sample_size)?;

            match self.ctx.domain_record_repository.save(&updated).await {
                Ok(saved) => {
                    let activated = previous_status != RecordStatus::Active
                        && saved.status.value == RecordStatus::Active;
                    log::debug!(
                        "Verified {} ({}): {previous_status} -> {} [{}/{}]",
                        saved.domain,
                        saved.id,
                        saved.status.value,
                        saved.verification.results.len(),
                        self.policy.sample_size
                    );
                    return Ok(VerificationOutcome {
                        record: saved,
                        previous_status,
                        activated,
                    });
                }
                Err(e) if e.is_stale_version() && attempt < MAX_SAVE_ATTEMPTS => {
                    log::debug!(
                        "Record {} changed during verification, reloading (attempt {attempt})",
                        current.id
                    );
                    attempt += 1;
                    current = self
                        .ctx
                        .domain_record_repository
                        .find_by_id(&current.id)
                        .await?
                        .ok_or_else(|| CoreError::not_found("domainRecord", current.id.clone()))?;
                    Self::check_reference(&current)?;
                }
                Err(e) => {
                    if matches!(
                        e,
                        CoreError::Conflict {
                            kind: ConflictKind::ActiveDomainTaken,
                            ..
                        }
                    ) {
                        self.note_attempt(current, sample.checked_at).await;
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Store `at` as the record's last attempt, leaving window and status
    /// untouched. Failures are logged only.
    async fn note_attempt(&self, record: DomainRecord, at: DateTime<Utc>) {
        let repo = &self.ctx.domain_record_repository;
        let mut current = record;
        for attempt in 1..=MAX_SAVE_ATTEMPTS {
            current.verification.last_attempt_at = Some(at);
            let err = match repo.save(&current).await {
                Ok(_) => return,
                Err(e) => e,
            };
            if !err.is_stale_version() || attempt == MAX_SAVE_ATTEMPTS {
                log::warn!(
                    "Failed to record verification attempt of {} ({}): {err}",
                    current.domain,
                    current.id
                );
                return;
            }
            match repo.find_by_id(&current.id).await {
                Ok(Some(fresh)) if !fresh.status.value.is_removed() => current = fresh,
                Ok(_) => return,
                Err(e) => {
                    log::warn!("Failed to reload {}: {e}", current.id);
                    return;
                }
            }
        }
    }

    /// Run the three DNS probes concurrently and combine them into one sample.
    pub async fn probe(&self, record: &DomainRecord) -> CoreResult<VerificationResult> {
        let probe = &self.ctx.dns_probe;
        let www_alias = record.www_alias();
        let challenge_host = record.challenge_host();

        let (ipv4, cname, txt) = futures::join!(
            probe.resolve_ipv4_diff(&record.domain, &record.ip_addresses),
            probe.resolve_cname_diff(&www_alias, &record.domain),
            probe.resolve_txt_diff(&challenge_host, &record.verification.code),
        );

        Ok(VerificationResult {
            ipv4_diff: ipv4?,
            cname_diff: cname?,
            txt_diff: txt?,
            checked_at: self.ctx.now(),
        })
    }

    /// Push `sample` into the window and apply the transition policy.
    pub fn apply_sample(
        &self,
        record: &mut DomainRecord,
        sample: VerificationResult,
        now: DateTime<Utc>,
    ) {
        record.verification.last_attempt_at = Some(sample.checked_at);
        record
            .verification
            .results
            .push(sample, self.policy.sample_size);
        self.policy.apply(record, now);
    }

    fn check_reference(record: &DomainRecord) -> CoreResult<()> {
        if record.id.is_empty() {
            return Err(CoreError::invalid_option("record", "id required"));
        }
        if record.version == 0 {
            return Err(CoreError::invalid_option("record", "not persisted"));
        }
        if record.verification.code.is_empty() {
            return Err(CoreError::invalid_option(
                "record",
                "verification code required",
            ));
        }
        if record.ip_addresses.is_empty() {
            return Err(CoreError::invalid_option(
                "record",
                "expected ip addresses required",
            ));
        }
        if record.status.value.is_removed() {
            return Err(CoreError::invalid_option(
                "record",
                format!("status is {}", record.status.value),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::test_utils::{test_context, test_record, TestHarness};
    use crate::traits::{Clock, DomainRecordRepository};
    use crate::types::reasons;
    use chrono::Duration;

    async fn saved_record(h: &TestHarness, domain: &str) -> DomainRecord {
        let record = test_record(domain, h.clock.now() + Duration::hours(48));
        h.repository.save(&record).await.unwrap()
    }

    #[tokio::test]
    async fn probe_combines_three_channels() {
        let h = test_context(5);
        let record = saved_record(&h, "example.com").await;
        h.probe.publish_record(&record).await;

        let sample = h.engine().probe(&record).await.unwrap();
        assert!(sample.ipv4_ok() && sample.cname_ok() && sample.txt_ok());
        assert_eq!(sample.txt_diff.matches, vec![record.verification.code.clone()]);
        assert_eq!(h.probe.call_count(), 3);
    }

    #[tokio::test]
    async fn five_successful_cycles_activate() {
        let h = test_context(5);
        let engine = h.engine();
        let mut record = saved_record(&h, "example.com").await;
        h.probe.publish_record(&record).await;

        let mut statuses = Vec::new();
        let mut activations = Vec::new();
        for _ in 0..5 {
            let outcome = engine.verify(record).await.unwrap();
            statuses.push(outcome.record.status.value);
            activations.push(outcome.activated);
            record = outcome.record;
        }

        assert_eq!(statuses[..4], [RecordStatus::Verifying; 4]);
        assert_eq!(statuses[4], RecordStatus::Active);
        assert_eq!(activations, vec![false, false, false, false, true]);
        assert_eq!(record.verification.results.len(), 5);
        assert_eq!(record.version, 6);
    }

    #[tokio::test]
    async fn window_never_exceeds_sample_size() {
        let h = test_context(3);
        let engine = h.engine();
        let mut record = saved_record(&h, "example.com").await;

        for _ in 0..7 {
            record = engine.verify(record).await.unwrap().record;
            assert!(record.verification.results.len() <= 3);
        }
        assert_eq!(record.status.value, RecordStatus::Failed);
    }

    #[tokio::test]
    async fn probe_error_keeps_window_and_records_attempt() {
        let h = test_context(5);
        let record = saved_record(&h, "example.com").await;
        h.probe
            .fail_host(
                &record.challenge_host(),
                ProbeError::Timeout {
                    host: record.challenge_host(),
                    timeout_ms: 10,
                },
            )
            .await;

        let err = h.engine().verify(record.clone()).await.unwrap_err();
        assert!(matches!(err, CoreError::Probe(ProbeError::Timeout { .. })));

        let stored = h.repository.find_by_id(&record.id).await.unwrap().unwrap();
        assert!(stored.verification.results.is_empty());
        assert_eq!(stored.status, record.status);
        assert_eq!(stored.verification.last_attempt_at, Some(h.clock.now()));
        assert_eq!(stored.version, record.version + 1);
    }

    #[tokio::test]
    async fn unsaved_record_is_rejected() {
        let h = test_context(5);
        let record = test_record("example.com", h.clock.now() + Duration::hours(48));
        assert_eq!(record.version, 0);

        let err = h.engine().verify(record.clone()).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidOption { ref kind, .. } if kind == "not persisted"
        ));
        assert_eq!(h.probe.call_count(), 0);
        assert!(h.repository.find_by_id(&record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn removed_record_is_rejected() {
        let h = test_context(5);
        let mut record = saved_record(&h, "example.com").await;
        record.set_status(
            RecordStatus::ScheduledForRemoval,
            reasons::USER_REMOVED,
            h.clock.now(),
        );

        let err = h.engine().verify(record).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidOption { .. }));
        assert_eq!(h.probe.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_ip_list_is_rejected() {
        let h = test_context(5);
        let mut record = saved_record(&h, "example.com").await;
        record.ip_addresses.clear();
        assert!(matches!(
            h.engine().verify(record).await,
            Err(CoreError::InvalidOption { .. })
        ));
    }

    #[tokio::test]
    async fn stale_copy_is_reloaded_and_sample_reapplied() {
        let h = test_context(5);
        let engine = h.engine();
        let stale = saved_record(&h, "example.com").await;

        // Someone else verifies first
        let fresh = engine.verify(stale.clone()).await.unwrap().record;
        assert_eq!(fresh.verification.results.len(), 1);

        let outcome = engine.verify(stale).await.unwrap();
        assert_eq!(outcome.record.verification.results.len(), 2);
        assert_eq!(outcome.record.version, fresh.version + 1);
    }

    #[tokio::test]
    async fn concurrent_activation_yields_one_conflict() {
        let h = test_context(1);
        let engine = Arc::new(h.engine());
        let first = saved_record(&h, "example.com").await;
        let second = saved_record(&h, "example.com").await;
        h.probe.publish_record(&first).await;
        // both records share the TXT host, publish both codes
        h.probe
            .set_txt(
                &first.challenge_host(),
                &[
                    first.verification.code.as_str(),
                    second.verification.code.as_str(),
                ],
            )
            .await;

        let (first_id, second_id) = (first.id.clone(), second.id.clone());
        let (a, b) = tokio::join!(
            {
                let engine = Arc::clone(&engine);
                async move { engine.verify(first).await }
            },
            {
                let engine = Arc::clone(&engine);
                async move { engine.verify(second).await }
            }
        );

        let results = [a, b];
        let activated = results
            .iter()
            .filter(|r| matches!(r, Ok(o) if o.activated))
            .count();
        let conflicts = results
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(CoreError::Conflict {
                        kind: ConflictKind::ActiveDomainTaken,
                        ..
                    })
                )
            })
            .count();
        assert_eq!(activated, 1);
        assert_eq!(conflicts, 1);

        // the losing record is not activated but its attempt is recorded
        for id in [&first_id, &second_id] {
            let stored = h.repository.find_by_id(id).await.unwrap().unwrap();
            assert_eq!(stored.verification.last_attempt_at, Some(h.clock.now()));
        }

        let active = h
            .repository
            .find_active_by_domain("example.com")
            .await
            .unwrap();
        assert!(active.is_some());
    }
}
