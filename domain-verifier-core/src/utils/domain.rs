//! Domain name normalisation and validation.

use crate::error::{CoreError, CoreResult};

const WWW_PREFIX: &str = "www.";
const MAX_LABEL_LENGTH: usize = 63;
const MAX_DOMAIN_LENGTH: usize = 253;

/// Strip one leading `www.` label, if present.
#[must_use]
pub fn strip_www(domain: &str) -> &str {
    domain.strip_prefix(WWW_PREFIX).unwrap_or(domain)
}

/// Canonical form of a user-supplied domain: trimmed, without the root dot,
/// IDNA-encoded (which also lower-cases it) and without a leading `www.`.
pub fn normalize_domain(domain: &str) -> CoreResult<String> {
    let trimmed = domain.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Err(CoreError::invalid_option("domain", "required"));
    }

    let ascii = idna::domain_to_ascii_strict(trimmed)
        .map_err(|_| CoreError::ValidationError(format!("{trimmed} is an invalid domain name")))?;

    Ok(strip_www(&ascii).to_string())
}

/// Check a canonical domain: at least two labels, none empty or longer than
/// 63 characters, and no leading `www.`.
pub fn validate_domain(domain: &str) -> CoreResult<()> {
    let invalid = || CoreError::ValidationError(format!("{domain} is an invalid domain name"));

    if domain.len() > MAX_DOMAIN_LENGTH || domain.starts_with(WWW_PREFIX) {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() <= 1 {
        return Err(invalid());
    }
    if labels
        .iter()
        .any(|label| label.is_empty() || label.len() > MAX_LABEL_LENGTH)
    {
        return Err(invalid());
    }

    Ok(())
}
