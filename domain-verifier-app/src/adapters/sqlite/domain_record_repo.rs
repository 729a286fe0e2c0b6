//! `DomainRecordRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use chrono::SecondsFormat;

use sea_orm::{
    ActiveValue::Set, ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    SqlErr,
};

use domain_verifier_core::error::{ConflictKind, CoreError, CoreResult};
use domain_verifier_core::traits::DomainRecordRepository;
use domain_verifier_core::types::{DomainRecord, RecordStatus, StatusScope};

use super::entity::domain_record;
use super::SqliteStore;

impl domain_record::Model {
    /// Convert a `SeaORM` row model into a `DomainRecord`.
    fn into_record(self) -> CoreResult<DomainRecord> {
        let mut record: DomainRecord = serde_json::from_str(&self.data).map_err(|e| {
            CoreError::SerializationError(format!("Invalid record JSON for {}: {e}", self.id))
        })?;
        record.version = u64::try_from(self.version).map_err(|_| {
            CoreError::SerializationError(format!(
                "Invalid version {} for {}",
                self.version, self.id
            ))
        })?;
        Ok(record)
    }
}

fn timestamp(dt: chrono::DateTime<chrono::Utc>) -> String {
    // fixed width so that text ordering matches time ordering
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Convert a record into a `SeaORM` active model.
fn record_to_active_model(record: &DomainRecord) -> CoreResult<domain_record::ActiveModel> {
    let data = serde_json::to_string(record)
        .map_err(|e| CoreError::SerializationError(e.to_string()))?;
    let version = i64::try_from(record.version)
        .map_err(|_| CoreError::StorageError(format!("Version overflow for {}", record.id)))?;

    Ok(domain_record::ActiveModel {
        id: Set(record.id.clone()),
        project_id: Set(record.project_id.clone()),
        domain: Set(record.domain.clone()),
        status: Set(record.status.value.as_str().to_string()),
        version: Set(version),
        created_at: Set(timestamp(record.created_at)),
        updated_at: Set(timestamp(record.updated_at)),
        last_attempt_at: Set(record
            .verification
            .last_attempt_at
            .map(timestamp)
            .unwrap_or_default()),
        data: Set(data),
    })
}

/// Map a write error, translating unique violations into conflicts.
///
/// `SQLite` reports a duplicate primary key with its own extended code, so the
/// constraint name in the message decides between the two conflict kinds.
fn write_error(err: &DbErr, record: &DomainRecord) -> CoreError {
    let message = err.to_string();
    if message.contains("UNIQUE constraint failed: domain_records.id") {
        return CoreError::conflict(
            ConflictKind::StaleVersion,
            format!("record {} already exists", record.id),
        );
    }
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        || message.contains("UNIQUE constraint failed")
    {
        return CoreError::conflict(
            ConflictKind::ActiveDomainTaken,
            format!("{} is already active on another record", record.domain),
        );
    }
    CoreError::StorageError(format!("Failed to save record {}: {message}", record.id))
}

fn query_error(err: &DbErr) -> CoreError {
    CoreError::StorageError(format!("Failed to query domain records: {err}"))
}

fn status_names(scope: &StatusScope) -> Vec<&'static str> {
    scope.statuses().into_iter().map(RecordStatus::as_str).collect()
}

fn into_records(rows: Vec<domain_record::Model>) -> CoreResult<Vec<DomainRecord>> {
    rows.into_iter().map(domain_record::Model::into_record).collect()
}

#[async_trait]
impl DomainRecordRepository for SqliteStore {
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<DomainRecord>> {
        domain_record::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| query_error(&e))?
            .map(domain_record::Model::into_record)
            .transpose()
    }

    async fn find_active_by_domain(&self, domain: &str) -> CoreResult<Option<DomainRecord>> {
        domain_record::Entity::find()
            .filter(domain_record::Column::Domain.eq(domain))
            .filter(domain_record::Column::Status.eq(RecordStatus::Active.as_str()))
            .one(&self.db)
            .await
            .map_err(|e| query_error(&e))?
            .map(domain_record::Model::into_record)
            .transpose()
    }

    async fn find_by_statuses(
        &self,
        scope: &StatusScope,
        limit: Option<u64>,
    ) -> CoreResult<Vec<DomainRecord>> {
        let statuses = status_names(scope);
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let rows = domain_record::Entity::find()
            .filter(domain_record::Column::Status.is_in(statuses))
            // "" (never attempted) sorts first
            .order_by_asc(domain_record::Column::LastAttemptAt)
            .order_by_asc(domain_record::Column::CreatedAt)
            .order_by_asc(domain_record::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| query_error(&e))?;

        into_records(rows)
    }

    async fn find_by_project(
        &self,
        project_id: &str,
        scope: &StatusScope,
    ) -> CoreResult<Vec<DomainRecord>> {
        let statuses = status_names(scope);
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let rows = domain_record::Entity::find()
            .filter(domain_record::Column::ProjectId.eq(project_id))
            .filter(domain_record::Column::Status.is_in(statuses))
            .order_by_asc(domain_record::Column::CreatedAt)
            .order_by_asc(domain_record::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| query_error(&e))?;

        into_records(rows)
    }

    async fn save(&self, record: &DomainRecord) -> CoreResult<DomainRecord> {
        let mut saved = record.clone();
        saved.version = record.version + 1;
        let active_model = record_to_active_model(&saved)?;

        if record.version == 0 {
            domain_record::Entity::insert(active_model)
                .exec(&self.db)
                .await
                .map_err(|e| write_error(&e, record))?;
            return Ok(saved);
        }

        let expected_version = i64::try_from(record.version)
            .map_err(|_| CoreError::StorageError(format!("Version overflow for {}", record.id)))?;

        let result = domain_record::Entity::update_many()
            .set(active_model)
            .filter(domain_record::Column::Id.eq(record.id.as_str()))
            .filter(domain_record::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await
            .map_err(|e| write_error(&e, record))?;

        if result.rows_affected == 0 {
            return match self.find_by_id(&record.id).await? {
                Some(current) => Err(CoreError::conflict(
                    ConflictKind::StaleVersion,
                    format!(
                        "record {} is at version {}, save was based on {}",
                        record.id, current.version, record.version
                    ),
                )),
                None => Err(CoreError::not_found("domainRecord", record.id.clone())),
            };
        }

        Ok(saved)
    }
}
