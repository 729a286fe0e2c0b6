//! Domain Verifier Core Library
//!
//! Core business logic of custom-domain ownership verification:
//! - sliding-window DNS sampling and per-channel scoring
//! - status transition policy
//! - domain record service (create, verify, restart, removal, queries)
//! - periodic verifier and rescheduler jobs
//!
//! Storage, DNS and event delivery are abstracted through traits so the
//! same logic runs against `SQLite`, in-memory stores and mocks.

pub mod config;
pub mod error;
pub mod jobs;
pub mod services;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use config::VerificationConfig;
pub use error::{ConflictKind, CoreError, CoreResult};
pub use jobs::{JobSchedule, PeriodicJob, TickSummary, VerificationJobs};
pub use services::{DomainRecordService, ServiceContext, VerificationEngine, VerificationOutcome};
pub use traits::{Clock, DnsProbe, DomainRecordRepository, SystemClock, WebsiteEventPublisher};
