use sea_orm::entity::prelude::*;

/// One row per domain record. Queryable columns are kept alongside the full
/// record, which is stored as JSON in `data`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "domain_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: String,
    pub domain: String,
    pub status: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
    /// Empty until the record's first verification attempt
    pub last_attempt_at: String,
    pub data: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
