//! Storage layer and collaborator abstraction trait definition

mod clock;
mod domain_record_repository;
mod event_publisher;

pub use clock::{Clock, SystemClock};
pub use domain_record_repository::{DomainRecordRepository, InMemoryDomainRecordRepository};
pub use event_publisher::{NoopWebsiteEventPublisher, WebsiteEventPublisher};

// Re-export the probe trait so callers depend on one crate
pub use domain_verifier_probe::DnsProbe;
