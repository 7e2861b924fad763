//! Redistribution - moving overflow funds back into buckets.
//!
//! Moves up to a target bucket's remaining room from the owner's money
//! bucket, recording a `redistribution_out` entry on the money bucket side
//! and a `redistribution` entry on the bucket side, and bumping the money
//! bucket's lifetime `total_redistributed` counter. One transaction under
//! the owner's write lock.

use crate::{
    core::{
        bucket, ledger,
        ledger::{NewBucketEntry, NewMoneyBucketEntry},
        locks::OwnerLocks,
        money_bucket,
    },
    entities::{
        MoneyBucketTransactionType, TransactionType, bucket as bucket_entity, bucket_entry,
        money_bucket as money_bucket_entity, money_bucket_entry,
    },
    errors::{Error, Result},
    money::Money,
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{info, instrument};

/// What a redistribution run changed.
///
/// When the target bucket has no room the operation is a no-op: the models
/// are returned unchanged and both entries are `None`.
#[derive(Debug, Clone)]
pub struct RedistributionOutcome {
    pub bucket: bucket_entity::Model,
    pub money_bucket: money_bucket_entity::Model,
    pub money_bucket_entry: Option<money_bucket_entry::Model>,
    pub bucket_entry: Option<bucket_entry::Model>,
}

/// Moves funds from the owner's money bucket into one bucket.
///
/// `amount` of `None` means "fill as much as possible". The moved amount is
/// capped by the bucket's room and the money bucket's balance. Fails with
/// `InsufficientFunds` when the money bucket is empty, `BucketLocked` when
/// the target is locked, and `MoneyBucketNotFound`/`BucketNotFound` when
/// either side is missing.
#[instrument(skip(db, locks))]
pub async fn redistribute(
    db: &DatabaseConnection,
    locks: &OwnerLocks,
    user_id: &str,
    target_bucket_id: i64,
    amount: Option<Money>,
) -> Result<RedistributionOutcome> {
    if let Some(requested) = amount {
        if !requested.is_positive() {
            return Err(Error::InvalidAmount { amount: requested });
        }
    }

    let _guard = locks.acquire(user_id).await;
    let txn = db.begin().await?;

    let mb = money_bucket::find_by_user_id(&txn, user_id)
        .await?
        .ok_or_else(|| Error::MoneyBucketNotFound {
            user_id: user_id.to_string(),
        })?;

    let target = bucket::find_by_id(&txn, target_bucket_id)
        .await?
        .filter(|b| b.user_id == user_id)
        .ok_or(Error::BucketNotFound {
            id: target_bucket_id,
        })?;

    if target.is_locked {
        return Err(Error::BucketLocked { id: target.id });
    }

    if mb.current_value.is_zero() {
        return Err(Error::InsufficientFunds {
            available: Money::ZERO,
            requested: amount.unwrap_or(target.room()),
        });
    }

    let room = target.room();
    if !room.is_positive() {
        // Target is already at (or past) its goal; nothing moves.
        return Ok(RedistributionOutcome {
            bucket: target,
            money_bucket: mb,
            money_bucket_entry: None,
            bucket_entry: None,
        });
    }

    let moved = amount.unwrap_or(room).min(room).min(mb.current_value);

    let mb_before = mb.current_value;
    let mb_after = mb_before.sub(moved)?;
    let bucket_before = target.current_value;
    let bucket_after = bucket_before + moved;
    let was_filled = bucket_before < target.target_value && bucket_after >= target.target_value;

    let updated_mb = money_bucket::update_balance(&txn, user_id, mb_after)
        .await?
        .ok_or_else(|| Error::MoneyBucketNotFound {
            user_id: user_id.to_string(),
        })?;
    let updated_mb = money_bucket::add_redistributed(&txn, user_id, moved)
        .await?
        .unwrap_or(updated_mb);

    let updated_bucket = bucket::update_bucket_state(&txn, target.id, bucket_after)
        .await?
        .ok_or(Error::BucketNotFound { id: target.id })?;

    let mb_entry = ledger::record_money_bucket_entry(
        &txn,
        NewMoneyBucketEntry {
            user_id: user_id.to_string(),
            money_bucket_id: updated_mb.id,
            deposit_event_id: None,
            target_bucket_id: Some(target.id),
            amount: -moved,
            balance_before: mb_before,
            balance_after: mb_after,
            transaction_type: MoneyBucketTransactionType::RedistributionOut,
        },
    )
    .await?;

    let bucket_entry = ledger::record_bucket_entry(
        &txn,
        NewBucketEntry {
            user_id: user_id.to_string(),
            bucket_id: target.id,
            deposit_event_id: None,
            amount: moved,
            balance_before: bucket_before,
            balance_after: bucket_after,
            was_filled,
            transaction_type: TransactionType::Redistribution,
        },
    )
    .await?;

    txn.commit()
        .await
        .map_err(|source| Error::TransactionFailed { source })?;

    info!(user_id, bucket_id = target.id, moved = %moved, "redistributed from money bucket");

    Ok(RedistributionOutcome {
        bucket: updated_bucket,
        money_bucket: updated_mb,
        money_bucket_entry: Some(mb_entry),
        bucket_entry: Some(bucket_entry),
    })
}
