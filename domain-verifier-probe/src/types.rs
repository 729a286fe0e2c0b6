//! Probe result types

use serde::{Deserialize, Serialize};

/// Difference between the values a DNS name is expected to resolve to and
/// the values it actually resolved to.
///
/// - `missing`: expected but not observed
/// - `extraneous`: observed but not expected
/// - `matches`: expected and observed
///
/// All three lists preserve the order of first appearance and hold no
/// duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsDiff {
    #[serde(default)]
    pub missing: Vec<String>,
    #[serde(default)]
    pub extraneous: Vec<String>,
    #[serde(default)]
    pub matches: Vec<String>,
}

impl DnsDiff {
    /// Compute the set difference between `expected` and `actual`.
    #[must_use]
    pub fn compute<E, A>(expected: &[E], actual: &[A]) -> Self
    where
        E: AsRef<str>,
        A: AsRef<str>,
    {
        let mut diff = Self::default();

        for value in expected {
            let value = value.as_ref();
            let observed = actual.iter().any(|a| a.as_ref() == value);
            let bucket = if observed {
                &mut diff.matches
            } else {
                &mut diff.missing
            };
            if !bucket.iter().any(|v| v == value) {
                bucket.push(value.to_string());
            }
        }

        for value in actual {
            let value = value.as_ref();
            if !expected.iter().any(|e| e.as_ref() == value)
                && !diff.extraneous.iter().any(|v| v == value)
            {
                diff.extraneous.push(value.to_string());
            }
        }

        diff
    }

    /// Every expected value was observed.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty()
    }

    /// The observed set equals the expected set.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.missing.is_empty() && self.extraneous.is_empty()
    }
}
