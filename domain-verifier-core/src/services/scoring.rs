//! 窗口评分

use serde::{Deserialize, Serialize};

use crate::types::VerificationWindow;

/// Per-channel success ratio over a window, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationScores {
    pub cname: f64,
    pub txt: f64,
    pub ipv4: f64,
}

/// Score every channel of `window`.
///
/// Returns `None` for an empty window; callers only score after pushing a
/// sample, so this never happens in the engine.
#[must_use]
pub fn compute_scores(window: &VerificationWindow) -> Option<VerificationScores> {
    if window.is_empty() {
        return None;
    }

    let mut cname = 0u32;
    let mut txt = 0u32;
    let mut ipv4 = 0u32;
    let mut total = 0u32;
    for result in window.iter() {
        total += 1;
        cname += u32::from(result.cname_ok());
        txt += u32::from(result.txt_ok());
        ipv4 += u32::from(result.ipv4_ok());
    }

    let ratio = |hits: u32| f64::from(hits) / f64::from(total);
    Some(VerificationScores {
        cname: ratio(cname),
        txt: ratio(txt),
        ipv4: ratio(ipv4),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{DnsDiff, VerificationResult};
    use chrono::Utc;

    fn compute_scores_of(results: &[VerificationResult]) -> Option<VerificationScores> {
        compute_scores(&results.iter().cloned().collect())
    }

    fn diff(missing: &[&str], extraneous: &[&str]) -> DnsDiff {
        DnsDiff {
            missing: missing.iter().map(ToString::to_string).collect(),
            extraneous: extraneous.iter().map(ToString::to_string).collect(),
            matches: Vec::new(),
        }
    }

    fn result(cname: DnsDiff, txt: DnsDiff, ipv4: DnsDiff) -> VerificationResult {
        VerificationResult {
            cname_diff: cname,
            txt_diff: txt,
            ipv4_diff: ipv4,
            checked_at: Utc::now(),
        }
    }

    fn ok() -> VerificationResult {
        result(diff(&[], &[]), diff(&[], &[]), diff(&[], &[]))
    }

    fn failed() -> VerificationResult {
        result(
            diff(&["example.com"], &[]),
            diff(&["code"], &[]),
            diff(&["10.0.0.1"], &[]),
        )
    }

    #[test]
    fn empty_window_has_no_score() {
        assert!(compute_scores(&VerificationWindow::new()).is_none());
    }

    #[test]
    fn all_success_scores_one() {
        let scores = compute_scores_of(&[ok(), ok(), ok()]).unwrap();
        assert_eq!(
            scores,
            VerificationScores {
                cname: 1.0,
                txt: 1.0,
                ipv4: 1.0
            }
        );
    }

    #[test]
    fn all_failure_scores_zero() {
        let scores = compute_scores_of(&[failed(), failed()]).unwrap();
        assert_eq!(
            scores,
            VerificationScores {
                cname: 0.0,
                txt: 0.0,
                ipv4: 0.0
            }
        );
    }

    #[test]
    fn mixed_window() {
        let scores = compute_scores_of(&[ok(), failed(), ok(), ok(), failed()]).unwrap();
        assert!((scores.cname - 0.6).abs() < 1e-9);
        assert!((scores.txt - 0.6).abs() < 1e-9);
        assert!((scores.ipv4 - 0.6).abs() < 1e-9);
    }

    #[test]
    fn extraneous_records_only_hurt_ipv4() {
        let r = result(
            diff(&[], &["other.example.net"]),
            diff(&[], &["stale-code"]),
            diff(&[], &["192.0.2.1"]),
        );
        let scores = compute_scores_of(&[r]).unwrap();
        assert_eq!(scores.cname, 1.0);
        assert_eq!(scores.txt, 1.0);
        assert_eq!(scores.ipv4, 0.0);
    }
}
