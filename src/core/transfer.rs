//! Withdrawals and bucket-to-bucket transfers.
//!
//! These are the outflow paths, and the only places a bucket's minimum hold
//! applies: a draw may not take the balance below the hold floor. Locking
//! gates *receiving*, so a locked bucket can still be drawn from but cannot
//! be a transfer destination. Each operation is one transaction under the
//! owner's write lock, with a ledger entry per touched bucket.

use crate::{
    core::{bucket, ledger, ledger::NewBucketEntry, locks::OwnerLocks},
    entities::{HoldType, TransactionType, bucket as bucket_entity, bucket_entry},
    errors::{Error, Result},
    money::Money,
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{info, instrument};

/// A withdrawal and the entry that recorded it.
#[derive(Debug, Clone)]
pub struct WithdrawalOutcome {
    pub bucket: bucket_entity::Model,
    pub entry: bucket_entry::Model,
}

/// A transfer and the pair of entries that recorded it.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub from_bucket: bucket_entity::Model,
    pub to_bucket: bucket_entity::Model,
    pub out_entry: bucket_entry::Model,
    pub in_entry: bucket_entry::Model,
}

/// The portion of a bucket's balance protected from draw-down, computed
/// against the balance at the time of the draw.
#[must_use]
pub fn hold_floor(bucket: &bucket_entity::Model) -> Money {
    if !bucket.has_minimum_hold {
        return Money::ZERO;
    }
    match (bucket.hold_type, bucket.hold_value) {
        (Some(HoldType::FlatValue), Some(value)) => Money::new(value),
        (Some(HoldType::Percentage), Some(value)) => bucket.current_value.percent(value),
        _ => Money::ZERO,
    }
}

fn drawable(bucket: &bucket_entity::Model) -> Money {
    bucket.current_value.saturating_sub(hold_floor(bucket))
}

async fn load_owned_bucket<C>(db: &C, user_id: &str, bucket_id: i64) -> Result<bucket_entity::Model>
where
    C: sea_orm::ConnectionTrait,
{
    bucket::find_by_id(db, bucket_id)
        .await?
        .filter(|b| b.user_id == user_id)
        .ok_or(Error::BucketNotFound { id: bucket_id })
}

/// Withdraws funds from a bucket.
///
/// Fails with `InsufficientFunds` when the draw would breach the bucket's
/// hold floor; `available` in the error already accounts for the hold.
#[instrument(skip(db, locks))]
pub async fn withdraw(
    db: &DatabaseConnection,
    locks: &OwnerLocks,
    user_id: &str,
    bucket_id: i64,
    amount: Money,
) -> Result<WithdrawalOutcome> {
    if !amount.is_positive() {
        return Err(Error::InvalidAmount { amount });
    }

    let _guard = locks.acquire(user_id).await;
    let txn = db.begin().await?;

    let source = load_owned_bucket(&txn, user_id, bucket_id).await?;

    let available = drawable(&source);
    if amount > available {
        return Err(Error::InsufficientFunds {
            available,
            requested: amount,
        });
    }

    let balance_before = source.current_value;
    let balance_after = balance_before.sub(amount)?;

    let updated = bucket::update_bucket_state(&txn, source.id, balance_after)
        .await?
        .ok_or(Error::BucketNotFound { id: source.id })?;

    let entry = ledger::record_bucket_entry(
        &txn,
        NewBucketEntry {
            user_id: user_id.to_string(),
            bucket_id: source.id,
            deposit_event_id: None,
            amount: -amount,
            balance_before,
            balance_after,
            was_filled: false,
            transaction_type: TransactionType::Withdrawal,
        },
    )
    .await?;

    txn.commit()
        .await
        .map_err(|source| Error::TransactionFailed { source })?;

    info!(user_id, bucket_id, amount = %amount, "withdrawal recorded");

    Ok(WithdrawalOutcome {
        bucket: updated,
        entry,
    })
}

/// Moves funds between two of an owner's buckets.
///
/// The source hold floor is enforced; the destination must not be locked.
/// Transfers may push the destination past its target (`is_full` is
/// recomputed and later deposits skip it).
#[instrument(skip(db, locks))]
pub async fn transfer(
    db: &DatabaseConnection,
    locks: &OwnerLocks,
    user_id: &str,
    from_bucket_id: i64,
    to_bucket_id: i64,
    amount: Money,
) -> Result<TransferOutcome> {
    if !amount.is_positive() || from_bucket_id == to_bucket_id {
        return Err(Error::InvalidAmount { amount });
    }

    let _guard = locks.acquire(user_id).await;
    let txn = db.begin().await?;

    let from = load_owned_bucket(&txn, user_id, from_bucket_id).await?;
    let to = load_owned_bucket(&txn, user_id, to_bucket_id).await?;

    if to.is_locked {
        return Err(Error::BucketLocked { id: to.id });
    }

    let available = drawable(&from);
    if amount > available {
        return Err(Error::InsufficientFunds {
            available,
            requested: amount,
        });
    }

    let from_before = from.current_value;
    let from_after = from_before.sub(amount)?;
    let to_before = to.current_value;
    let to_after = to_before + amount;
    let was_filled = to_before < to.target_value && to_after >= to.target_value;

    let updated_from = bucket::update_bucket_state(&txn, from.id, from_after)
        .await?
        .ok_or(Error::BucketNotFound { id: from.id })?;
    let updated_to = bucket::update_bucket_state(&txn, to.id, to_after)
        .await?
        .ok_or(Error::BucketNotFound { id: to.id })?;

    let out_entry = ledger::record_bucket_entry(
        &txn,
        NewBucketEntry {
            user_id: user_id.to_string(),
            bucket_id: from.id,
            deposit_event_id: None,
            amount: -amount,
            balance_before: from_before,
            balance_after: from_after,
            was_filled: false,
            transaction_type: TransactionType::Transfer,
        },
    )
    .await?;

    let in_entry = ledger::record_bucket_entry(
        &txn,
        NewBucketEntry {
            user_id: user_id.to_string(),
            bucket_id: to.id,
            deposit_event_id: None,
            amount,
            balance_before: to_before,
            balance_after: to_after,
            was_filled,
            transaction_type: TransactionType::Transfer,
        },
    )
    .await?;

    txn.commit()
        .await
        .map_err(|source| Error::TransactionFailed { source })?;

    info!(
        user_id,
        from_bucket_id,
        to_bucket_id,
        amount = %amount,
        "transfer recorded"
    );

    Ok(TransferOutcome {
        from_bucket: updated_from,
        to_bucket: updated_to,
        out_entry,
        in_entry,
    })
}
