//! Shared test utilities for `Bucketflow`.
//!
//! Common helpers for setting up test databases, creating buckets with
//! sensible defaults, and asserting the two system-wide ledger properties:
//! owner-level conservation and per-bucket replay.

use crate::{
    config,
    core::{bucket, bucket::NewBucket, locks::OwnerLocks, money_bucket},
    entities::{
        BucketEntry, DepositEvent, FilterMethod, MoneyBucketEntry, TransactionType, bucket_entry,
        deposit_event, money_bucket_entry,
    },
    errors::Result,
    money::Money,
};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Installs a quiet test subscriber once per process.
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_logging();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    config::database::create_tables(&db).await?;
    Ok(db)
}

/// Database plus a fresh lock registry, for tests that drive the engine
/// entry points.
pub async fn setup_test_engine() -> Result<(DatabaseConnection, OwnerLocks)> {
    Ok((setup_test_db().await?, OwnerLocks::new()))
}

/// A bucket spec with sensible defaults: target 500.00, flat filter of
/// 100.00 per deposit, no hold, unlocked, zero balance.
#[must_use]
pub fn test_bucket_spec(user_id: &str, name: &str, priority_index: i32) -> NewBucket {
    NewBucket {
        user_id: user_id.to_string(),
        name: name.to_string(),
        target_value: Money::new(dec!(500.00)),
        current_value: None,
        priority_index,
        filter_method: FilterMethod::FlatValue,
        filter_value: dec!(100.00),
        has_minimum_hold: false,
        hold_type: None,
        hold_value: None,
        is_locked: false,
    }
}

/// Creates a bucket from [`test_bucket_spec`] defaults.
pub async fn create_test_bucket(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
    priority_index: i32,
) -> Result<crate::entities::bucket::Model> {
    bucket::create(db, test_bucket_spec(user_id, name, priority_index)).await
}

/// Asserts the owner-level conservation invariant:
/// `sum(bucket balances) + money bucket balance` equals the seeded baseline
/// plus every deposit's `total_processed` minus every withdrawal.
///
/// The baseline accounts for buckets created with a non-zero starting value
/// in tests: it is each account's balance before its first ledger entry (or
/// its current balance when it has no ledger history).
pub async fn assert_owner_invariant(db: &DatabaseConnection, user_id: &str) -> Result<()> {
    let buckets = bucket::find_by_user_id(db, user_id).await?;
    let mb = money_bucket::find_by_user_id(db, user_id).await?;

    let deposits = DepositEvent::find()
        .filter(deposit_event::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    let deposit_total = deposits
        .iter()
        .fold(Money::ZERO, |acc, e| acc + e.total_processed);

    let bucket_entries = BucketEntry::find()
        .filter(bucket_entry::Column::UserId.eq(user_id))
        .order_by_asc(bucket_entry::Column::Id)
        .all(db)
        .await?;
    let withdrawal_total = bucket_entries
        .iter()
        .filter(|e| e.transaction_type == TransactionType::Withdrawal)
        .fold(Money::ZERO, |acc, e| acc + -e.amount);

    let mut baseline = Money::ZERO;
    for b in &buckets {
        let first = bucket_entries.iter().find(|e| e.bucket_id == b.id);
        baseline += first.map_or(b.current_value, |e| e.balance_before);
    }

    let mut current_total = buckets
        .iter()
        .fold(Money::ZERO, |acc, b| acc + b.current_value);

    if let Some(mb) = mb {
        let first_mb_entry = MoneyBucketEntry::find()
            .filter(money_bucket_entry::Column::UserId.eq(user_id))
            .order_by_asc(money_bucket_entry::Column::Id)
            .one(db)
            .await?;
        baseline += first_mb_entry.map_or(mb.current_value, |e| e.balance_before);
        current_total += mb.current_value;
    }

    assert_eq!(
        current_total,
        baseline + deposit_total + -withdrawal_total,
        "owner {user_id}: balances diverged from the ledger"
    );

    Ok(())
}

/// Asserts that replaying a bucket's ledger entries in creation order
/// reconstructs its current balance exactly, with every entry chaining onto
/// the previous one.
pub async fn assert_bucket_ledger_replays(db: &DatabaseConnection, bucket_id: i64) -> Result<()> {
    let entries = BucketEntry::find()
        .filter(bucket_entry::Column::BucketId.eq(bucket_id))
        .order_by_asc(bucket_entry::Column::Id)
        .all(db)
        .await?;

    let Some(first) = entries.first() else {
        return Ok(());
    };

    let mut balance = first.balance_before;
    for entry in &entries {
        assert_eq!(
            entry.balance_before, balance,
            "entry {} does not chain onto its predecessor",
            entry.id
        );
        assert_eq!(entry.balance_before + entry.amount, entry.balance_after);
        balance = entry.balance_after;
    }

    if let Some(b) = bucket::find_by_id(db, bucket_id).await? {
        assert_eq!(b.current_value, balance, "replay diverges from balance");
    }

    Ok(())
}
