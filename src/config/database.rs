//! Database configuration module.
//!
//! Handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the database schema always matches
//! the Rust struct definitions without hand-written SQL.

use crate::entities::{Bucket, BucketEntry, DepositEvent, MoneyBucket, MoneyBucketEntry};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/bucketflow.sqlite";

/// Resolves the database URL from the environment (loading `.env` first),
/// falling back to a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url())
        .await
        .map_err(Into::into)
}

/// Creates all tables from the entity definitions: buckets, money buckets,
/// deposit events, and the two ledger-entry tables.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let bucket_table = schema.create_table_from_entity(Bucket);
    let money_bucket_table = schema.create_table_from_entity(MoneyBucket);
    let deposit_event_table = schema.create_table_from_entity(DepositEvent);
    let bucket_entry_table = schema.create_table_from_entity(BucketEntry);
    let money_bucket_entry_table = schema.create_table_from_entity(MoneyBucketEntry);

    db.execute(builder.build(&bucket_table)).await?;
    db.execute(builder.build(&money_bucket_table)).await?;
    db.execute(builder.build(&deposit_event_table)).await?;
    db.execute(builder.build(&bucket_entry_table)).await?;
    db.execute(builder.build(&money_bucket_entry_table)).await?;

    Ok(())
}
