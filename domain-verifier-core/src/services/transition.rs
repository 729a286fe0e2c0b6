//! 状态转换策略
//!
//! The single place that turns a scored window into a status. Both the
//! engine and tests go through [`TransitionPolicy::evaluate`].

use chrono::{DateTime, Utc};

use super::scoring::{compute_scores, VerificationScores};
use crate::config::VerificationConfig;
use crate::types::{reasons, ChannelResult, DomainRecord, PartialResults, RecordStatus};

/// Result of evaluating a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub status: RecordStatus,
    pub reason: &'static str,
    pub partial_results: PartialResults,
}

/// Decision thresholds, usually taken from [`VerificationConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionPolicy {
    pub sample_size: usize,
    pub activation_threshold: f64,
}

impl TransitionPolicy {
    #[must_use]
    pub fn new(sample_size: usize, activation_threshold: f64) -> Self {
        Self {
            sample_size,
            activation_threshold,
        }
    }

    #[must_use]
    pub fn from_config(config: &VerificationConfig) -> Self {
        Self::new(config.sample_size, config.activation_threshold)
    }

    /// Per-channel activity. The CNAME channel is always active when the
    /// www alias is disabled.
    #[must_use]
    pub fn partial_results(
        &self,
        scores: VerificationScores,
        enable_www_alias: bool,
    ) -> PartialResults {
        let channel = |score: f64| ChannelResult {
            score,
            active: score >= self.activation_threshold,
        };

        let mut cname = channel(scores.cname);
        if !enable_www_alias {
            cname.active = true;
        }

        PartialResults {
            cname,
            txt: channel(scores.txt),
            ipv4: channel(scores.ipv4),
        }
    }

    /// Next status for `record`, or `None` while its window is empty.
    #[must_use]
    pub fn evaluate(&self, record: &DomainRecord, now: DateTime<Utc>) -> Option<Transition> {
        let window = &record.verification.results;
        let scores = compute_scores(window)?;
        let partial_results = self.partial_results(scores, record.enable_www_alias);

        let (status, reason) = if window.len() < self.sample_size {
            (RecordStatus::Verifying, reasons::VERIFICATION_IN_PROCESS)
        } else if partial_results.is_active() {
            (RecordStatus::Active, reasons::VERIFICATION_SUCCESS)
        } else if now > record.verification.expires_at {
            (
                RecordStatus::FailedPermanently,
                reasons::VERIFICATION_EXPIRED,
            )
        } else {
            (RecordStatus::Failed, reasons::VERIFICATION_FAILED)
        };

        Some(Transition {
            status,
            reason,
            partial_results,
        })
    }

    /// Evaluate and write the outcome into `record`.
    ///
    /// Returns the applied transition; the record is left untouched for an
    /// empty window.
    pub fn apply(&self, record: &mut DomainRecord, now: DateTime<Utc>) -> Option<Transition> {
        let transition = self.evaluate(record, now)?;
        record.verification.computed_partial_results = Some(transition.partial_results);
        record.set_status(transition.status, transition.reason, now);
        Some(transition)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{failing_txt_result, passing_result, test_record};
    use chrono::Duration;

    fn policy() -> TransitionPolicy {
        TransitionPolicy::new(5, 0.6)
    }

    #[test]
    fn empty_window_is_not_evaluated() {
        let record = test_record("example.com", Utc::now() + Duration::hours(1));
        assert!(policy().evaluate(&record, Utc::now()).is_none());
    }

    #[test]
    fn five_successes_verify_then_activate() {
        let now = Utc::now();
        let mut record = test_record("example.com", now + Duration::hours(48));
        let policy = policy();

        let mut seen = Vec::new();
        for _ in 0..5 {
            record.verification.results.push(passing_result(&record, now), 5);
            seen.push(policy.apply(&mut record, now).unwrap().status);
        }

        assert_eq!(
            seen,
            vec![
                RecordStatus::Verifying,
                RecordStatus::Verifying,
                RecordStatus::Verifying,
                RecordStatus::Verifying,
                RecordStatus::Active,
            ]
        );
        assert_eq!(record.status.reason, reasons::VERIFICATION_SUCCESS);
        assert!(record.verification.computed_partial_results.unwrap().is_active());
    }

    #[test]
    fn txt_missing_fails_before_expiry() {
        let now = Utc::now();
        let mut record = test_record("example.com", now + Duration::hours(48));
        for _ in 0..5 {
            record.verification.results.push(failing_txt_result(&record, now), 5);
        }

        let t = policy().evaluate(&record, now).unwrap();
        assert_eq!(t.status, RecordStatus::Failed);
        assert_eq!(t.reason, reasons::VERIFICATION_FAILED);
        assert_eq!(t.partial_results.txt.score, 0.0);
        assert!(!t.partial_results.txt.active);
        assert!(t.partial_results.ipv4.active);
    }

    #[test]
    fn txt_missing_fails_permanently_after_expiry() {
        let now = Utc::now();
        let mut record = test_record("example.com", now - Duration::minutes(1));
        for _ in 0..5 {
            record.verification.results.push(failing_txt_result(&record, now), 5);
        }

        let t = policy().evaluate(&record, now).unwrap();
        assert_eq!(t.status, RecordStatus::FailedPermanently);
        assert_eq!(t.reason, reasons::VERIFICATION_EXPIRED);
    }

    #[test]
    fn expiry_is_ignored_while_window_is_filling() {
        let now = Utc::now();
        let mut record = test_record("example.com", now - Duration::hours(1));
        record.verification.results.push(failing_txt_result(&record, now), 5);
        assert_eq!(
            policy().evaluate(&record, now).unwrap().status,
            RecordStatus::Verifying
        );
    }

    #[test]
    fn cname_ignored_without_www_alias() {
        let now = Utc::now();
        let mut record = test_record("example.com", now + Duration::hours(1));
        record.enable_www_alias = false;
        for _ in 0..5 {
            let mut r = passing_result(&record, now);
            r.cname_diff.missing = vec![record.domain.clone()];
            record.verification.results.push(r, 5);
        }

        let t = policy().evaluate(&record, now).unwrap();
        assert_eq!(t.status, RecordStatus::Active);
        assert_eq!(t.partial_results.cname.score, 0.0);
        assert!(t.partial_results.cname.active);

        record.enable_www_alias = true;
        assert_eq!(
            policy().evaluate(&record, now).unwrap().status,
            RecordStatus::Failed
        );
    }

    #[test]
    fn threshold_is_inclusive() {
        let now = Utc::now();
        let mut record = test_record("example.com", now + Duration::hours(1));
        // 3 of 5 pass: exactly 0.6
        for i in 0..5 {
            let r = if i < 2 {
                failing_txt_result(&record, now)
            } else {
                passing_result(&record, now)
            };
            record.verification.results.push(r, 5);
        }
        assert_eq!(
            policy().evaluate(&record, now).unwrap().status,
            RecordStatus::Active
        );
    }
}
