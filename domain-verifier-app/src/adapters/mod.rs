//! Storage and outbound adapters for the daemon and CLI frontends.

mod log_event_publisher;

pub use log_event_publisher::LogEventPublisher;

#[cfg(feature = "sqlite-store")]
mod sqlite;

#[cfg(feature = "sqlite-store")]
pub use sqlite::SqliteStore;
