//! Helpers

pub mod domain;
pub mod duration;

pub use domain::{normalize_domain, strip_www, validate_domain};
