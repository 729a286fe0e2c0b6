//! `SeaORM` entities for `SqliteStore`.

pub mod domain_record;
