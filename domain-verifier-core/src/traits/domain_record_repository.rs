//! Domain record persistence abstract Trait

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ConflictKind, CoreError, CoreResult};
use crate::types::{DomainRecord, RecordStatus, StatusScope};

/// Domain Record Repository Trait
///
/// `save` is the only write path and must be atomic:
/// - a record with `version == 0` is inserted;
/// - otherwise the stored row is replaced only if its version still equals
///   `record.version`, else `Conflict(StaleVersion)`;
/// - at most one record per domain may be stored in status `active`, else
///   `Conflict(ActiveDomainTaken)`.
///
/// On success the saved record is returned with its version incremented.
///
/// 平台实现:
/// - `InMemoryDomainRecordRepository` (tests, single-process deployments)
/// - `SqliteStore` (`SeaORM`)
#[async_trait]
pub trait DomainRecordRepository: Send + Sync {
    /// Find a record by ID
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<DomainRecord>>;

    /// Find the `active` record for a canonical domain
    async fn find_active_by_domain(&self, domain: &str) -> CoreResult<Option<DomainRecord>>;

    /// Records whose status is within `scope`, capped at `limit`.
    ///
    /// Never-attempted records come first, then least recently attempted,
    /// then oldest.
    async fn find_by_statuses(
        &self,
        scope: &StatusScope,
        limit: Option<u64>,
    ) -> CoreResult<Vec<DomainRecord>>;

    /// Records of a project whose status is within `scope`, oldest first
    async fn find_by_project(
        &self,
        project_id: &str,
        scope: &StatusScope,
    ) -> CoreResult<Vec<DomainRecord>>;

    /// Versioned, uniqueness-checked save
    async fn save(&self, record: &DomainRecord) -> CoreResult<DomainRecord>;
}

/// In-memory domain record repository
///
/// Holds every record behind one lock, so version and uniqueness checks are
/// atomic with the write.
#[derive(Clone, Default)]
pub struct InMemoryDomainRecordRepository {
    records: Arc<RwLock<HashMap<String, DomainRecord>>>,
}

impl InMemoryDomainRecordRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut records: Vec<DomainRecord>) -> Vec<DomainRecord> {
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        records
    }

    fn by_last_attempt(mut records: Vec<DomainRecord>) -> Vec<DomainRecord> {
        // `None` sorts before `Some`
        records.sort_by(|a, b| {
            a.verification
                .last_attempt_at
                .cmp(&b.verification.last_attempt_at)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        records
    }
}

#[async_trait]
impl DomainRecordRepository for InMemoryDomainRecordRepository {
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<DomainRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_active_by_domain(&self, domain: &str) -> CoreResult<Option<DomainRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.domain == domain && r.status.value == RecordStatus::Active)
            .cloned())
    }

    async fn find_by_statuses(
        &self,
        scope: &StatusScope,
        limit: Option<u64>,
    ) -> CoreResult<Vec<DomainRecord>> {
        let matching: Vec<DomainRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| scope.matches(r.status.value))
            .cloned()
            .collect();

        let mut sorted = Self::by_last_attempt(matching);
        if let Some(limit) = limit {
            sorted.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(sorted)
    }

    async fn find_by_project(
        &self,
        project_id: &str,
        scope: &StatusScope,
    ) -> CoreResult<Vec<DomainRecord>> {
        let matching: Vec<DomainRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.project_id == project_id && scope.matches(r.status.value))
            .cloned()
            .collect();
        Ok(Self::sorted(matching))
    }

    async fn save(&self, record: &DomainRecord) -> CoreResult<DomainRecord> {
        let mut store = self.records.write().await;

        let stored_version = store.get(&record.id).map(|r| r.version);
        match stored_version {
            None if record.version != 0 => {
                return Err(CoreError::not_found("domainRecord", record.id.clone()));
            }
            Some(v) if v != record.version => {
                return Err(CoreError::conflict(
                    ConflictKind::StaleVersion,
                    format!(
                        "record {} is at version {v}, save was based on {}",
                        record.id, record.version
                    ),
                ));
            }
            _ => {}
        }

        if record.status.value == RecordStatus::Active
            && store.values().any(|other| {
                other.id != record.id
                    && other.domain == record.domain
                    && other.status.value == RecordStatus::Active
            })
        {
            return Err(CoreError::conflict(
                ConflictKind::ActiveDomainTaken,
                format!("{} is already active on another record", record.domain),
            ));
        }

        let mut saved = record.clone();
        saved.version += 1;
        store.insert(saved.id.clone(), saved.clone());
        Ok(saved)
    }
}
