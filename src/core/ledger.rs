//! Ledger store - append-only persistence for the three ledger kinds.
//!
//! Deposit events, bucket ledger entries, and money bucket ledger entries are
//! written once and never changed: the `update_*`/`delete_*` functions exist
//! only to fail with [`Error::ImmutableRecord`] so the contract is explicit at
//! the repository boundary. Listings are reverse-chronological and paginated.
//!
//! Every append checks `balance_after == balance_before + amount` before
//! touching storage; a ledger that cannot replay is worse than a rejected
//! write.

use crate::{
    entities::{
        BucketEntry, DepositEvent, MoneyBucketEntry, MoneyBucketTransactionType, TransactionType,
        bucket_entry, deposit_event, money_bucket_entry,
    },
    errors::{Error, Result},
    money::Money,
    pagination::{Page, PaginationOptions},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Set, prelude::*};

/// Input for one deposit event record.
#[derive(Debug, Clone)]
pub struct NewDepositEvent {
    pub user_id: String,
    pub original_amount: Money,
    pub total_processed: Money,
    pub money_bucket_amount: Money,
}

/// Input for one bucket ledger entry.
#[derive(Debug, Clone)]
pub struct NewBucketEntry {
    pub user_id: String,
    pub bucket_id: i64,
    pub deposit_event_id: Option<i64>,
    pub amount: Money,
    pub balance_before: Money,
    pub balance_after: Money,
    pub was_filled: bool,
    pub transaction_type: TransactionType,
}

/// Input for one money bucket ledger entry.
#[derive(Debug, Clone)]
pub struct NewMoneyBucketEntry {
    pub user_id: String,
    pub money_bucket_id: i64,
    pub deposit_event_id: Option<i64>,
    pub target_bucket_id: Option<i64>,
    pub amount: Money,
    pub balance_before: Money,
    pub balance_after: Money,
    pub transaction_type: MoneyBucketTransactionType,
}

fn check_reconciles(before: Money, amount: Money, after: Money) -> Result<()> {
    if before + amount != after {
        return Err(Error::Config {
            message: format!(
                "ledger entry does not reconcile: {before} + {amount} != {after}"
            ),
        });
    }
    Ok(())
}

// --- deposit events ---

/// Appends a deposit event.
pub async fn record_deposit_event<C>(
    db: &C,
    event: NewDepositEvent,
) -> Result<deposit_event::Model>
where
    C: ConnectionTrait,
{
    let model = deposit_event::ActiveModel {
        original_amount: Set(event.original_amount),
        total_processed: Set(event.total_processed),
        money_bucket_amount: Set(event.money_bucket_amount),
        user_id: Set(event.user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

pub async fn find_deposit_event_by_id<C>(db: &C, id: i64) -> Result<Option<deposit_event::Model>>
where
    C: ConnectionTrait,
{
    DepositEvent::find_by_id(id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Reverse-chronological deposit events for an owner.
pub async fn deposit_events_for_user(
    db: &DatabaseConnection,
    user_id: &str,
    options: &PaginationOptions,
) -> Result<Page<deposit_event::Model>> {
    let filter = deposit_event::Column::UserId.eq(user_id);

    let total = DepositEvent::find().filter(filter.clone()).count(db).await?;
    let items = DepositEvent::find()
        .filter(filter)
        .order_by_desc(deposit_event::Column::CreatedAt)
        .order_by_desc(deposit_event::Column::Id)
        .limit(options.limit())
        .offset(options.offset())
        .all(db)
        .await?;

    Ok(Page::new(items, total, options.limit(), options.offset()))
}

/// Deposit events never change once written.
pub fn update_deposit_event(id: i64) -> Result<deposit_event::Model> {
    Err(Error::ImmutableRecord {
        entity: "deposit event",
        id,
    })
}

/// Ledger history is permanent; deposit events cannot be deleted.
pub fn delete_deposit_event(id: i64) -> Result<bool> {
    Err(Error::ImmutableRecord {
        entity: "deposit event",
        id,
    })
}

// --- bucket ledger entries ---

/// Appends one bucket ledger entry.
pub async fn record_bucket_entry<C>(db: &C, entry: NewBucketEntry) -> Result<bucket_entry::Model>
where
    C: ConnectionTrait,
{
    check_reconciles(entry.balance_before, entry.amount, entry.balance_after)?;

    let model = bucket_entry::ActiveModel {
        amount: Set(entry.amount),
        balance_before: Set(entry.balance_before),
        balance_after: Set(entry.balance_after),
        was_filled: Set(entry.was_filled),
        transaction_type: Set(entry.transaction_type),
        bucket_id: Set(entry.bucket_id),
        deposit_event_id: Set(entry.deposit_event_id),
        user_id: Set(entry.user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Appends a batch of bucket ledger entries in order.
pub async fn record_bucket_entries<C>(
    db: &C,
    entries: Vec<NewBucketEntry>,
) -> Result<Vec<bucket_entry::Model>>
where
    C: ConnectionTrait,
{
    let mut created = Vec::with_capacity(entries.len());
    for entry in entries {
        created.push(record_bucket_entry(db, entry).await?);
    }
    Ok(created)
}

pub async fn find_bucket_entry_by_id<C>(db: &C, id: i64) -> Result<Option<bucket_entry::Model>>
where
    C: ConnectionTrait,
{
    BucketEntry::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Reverse-chronological entries for one bucket. The bucket itself may
/// already be deleted; its history remains queryable.
pub async fn bucket_entries_for_bucket(
    db: &DatabaseConnection,
    bucket_id: i64,
    options: &PaginationOptions,
) -> Result<Page<bucket_entry::Model>> {
    paginate_bucket_entries(db, bucket_entry::Column::BucketId.eq(bucket_id), options).await
}

/// Reverse-chronological entries across all of an owner's buckets.
pub async fn bucket_entries_for_user(
    db: &DatabaseConnection,
    user_id: &str,
    options: &PaginationOptions,
) -> Result<Page<bucket_entry::Model>> {
    paginate_bucket_entries(db, bucket_entry::Column::UserId.eq(user_id), options).await
}

async fn paginate_bucket_entries(
    db: &DatabaseConnection,
    filter: sea_orm::sea_query::SimpleExpr,
    options: &PaginationOptions,
) -> Result<Page<bucket_entry::Model>> {
    let total = BucketEntry::find().filter(filter.clone()).count(db).await?;
    let items = BucketEntry::find()
        .filter(filter)
        .order_by_desc(bucket_entry::Column::CreatedAt)
        .order_by_desc(bucket_entry::Column::Id)
        .limit(options.limit())
        .offset(options.offset())
        .all(db)
        .await?;

    Ok(Page::new(items, total, options.limit(), options.offset()))
}

/// All bucket entries produced by one deposit fan-out, oldest first.
pub async fn bucket_entries_for_deposit_event<C>(
    db: &C,
    deposit_event_id: i64,
) -> Result<Vec<bucket_entry::Model>>
where
    C: ConnectionTrait,
{
    BucketEntry::find()
        .filter(bucket_entry::Column::DepositEventId.eq(deposit_event_id))
        .order_by_asc(bucket_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Bucket ledger entries never change once written.
pub fn update_bucket_entry(id: i64) -> Result<bucket_entry::Model> {
    Err(Error::ImmutableRecord {
        entity: "bucket ledger entry",
        id,
    })
}

/// Ledger history is permanent; bucket entries cannot be deleted.
pub fn delete_bucket_entry(id: i64) -> Result<bool> {
    Err(Error::ImmutableRecord {
        entity: "bucket ledger entry",
        id,
    })
}

// --- money bucket ledger entries ---

/// Appends one money bucket ledger entry.
pub async fn record_money_bucket_entry<C>(
    db: &C,
    entry: NewMoneyBucketEntry,
) -> Result<money_bucket_entry::Model>
where
    C: ConnectionTrait,
{
    check_reconciles(entry.balance_before, entry.amount, entry.balance_after)?;

    let model = money_bucket_entry::ActiveModel {
        amount: Set(entry.amount),
        balance_before: Set(entry.balance_before),
        balance_after: Set(entry.balance_after),
        transaction_type: Set(entry.transaction_type),
        money_bucket_id: Set(entry.money_bucket_id),
        deposit_event_id: Set(entry.deposit_event_id),
        target_bucket_id: Set(entry.target_bucket_id),
        user_id: Set(entry.user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Reverse-chronological money bucket entries for an owner.
pub async fn money_bucket_entries_for_user(
    db: &DatabaseConnection,
    user_id: &str,
    options: &PaginationOptions,
) -> Result<Page<money_bucket_entry::Model>> {
    let filter = money_bucket_entry::Column::UserId.eq(user_id);

    let total = MoneyBucketEntry::find()
        .filter(filter.clone())
        .count(db)
        .await?;
    let items = MoneyBucketEntry::find()
        .filter(filter)
        .order_by_desc(money_bucket_entry::Column::CreatedAt)
        .order_by_desc(money_bucket_entry::Column::Id)
        .limit(options.limit())
        .offset(options.offset())
        .all(db)
        .await?;

    Ok(Page::new(items, total, options.limit(), options.offset()))
}

/// All money bucket entries produced by one deposit fan-out, oldest first.
pub async fn money_bucket_entries_for_deposit_event<C>(
    db: &C,
    deposit_event_id: i64,
) -> Result<Vec<money_bucket_entry::Model>>
where
    C: ConnectionTrait,
{
    MoneyBucketEntry::find()
        .filter(money_bucket_entry::Column::DepositEventId.eq(deposit_event_id))
        .order_by_asc(money_bucket_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Money bucket ledger entries never change once written.
pub fn update_money_bucket_entry(id: i64) -> Result<money_bucket_entry::Model> {
    Err(Error::ImmutableRecord {
        entity: "money bucket ledger entry",
        id,
    })
}

/// Ledger history is permanent; money bucket entries cannot be deleted.
pub fn delete_money_bucket_entry(id: i64) -> Result<bool> {
    Err(Error::ImmutableRecord {
        entity: "money bucket ledger entry",
        id,
    })
}
