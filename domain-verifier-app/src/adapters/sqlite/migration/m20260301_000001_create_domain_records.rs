use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// At most one `active` record per domain.
const ACTIVE_DOMAIN_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS idx_domain_records_active_domain \
     ON domain_records (domain) WHERE status = 'active'";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // domain_records 表
        manager
            .create_table(
                Table::create()
                    .table(DomainRecord::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DomainRecord::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DomainRecord::ProjectId).string().not_null())
                    .col(ColumnDef::new(DomainRecord::Domain).string().not_null())
                    .col(ColumnDef::new(DomainRecord::Status).string().not_null())
                    .col(
                        ColumnDef::new(DomainRecord::Version)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(DomainRecord::CreatedAt).string().not_null())
                    .col(ColumnDef::new(DomainRecord::UpdatedAt).string().not_null())
                    .col(
                        ColumnDef::new(DomainRecord::LastAttemptAt)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(DomainRecord::Data).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_domain_records_status")
                    .table(DomainRecord::Table)
                    .col(DomainRecord::Status)
                    .col(DomainRecord::LastAttemptAt)
                    .col(DomainRecord::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_domain_records_project")
                    .table(DomainRecord::Table)
                    .col(DomainRecord::ProjectId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // partial index, not expressible through the index builder
        manager
            .get_connection()
            .execute_unprepared(ACTIVE_DOMAIN_INDEX)
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DomainRecord::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum DomainRecord {
    #[sea_orm(iden = "domain_records")]
    Table,
    Id,
    ProjectId,
    Domain,
    Status,
    Version,
    CreatedAt,
    UpdatedAt,
    LastAttemptAt,
    Data,
}
