//! Money bucket repository - the single-per-owner overflow account.
//!
//! Unallocated deposit funds accumulate here and flow back out through
//! redistribution. `find_by_user_id` returns at most one record; creation is
//! guarded so a second money bucket for the same owner is a configuration
//! error rather than silent duplication.

use crate::{
    entities::{MoneyBucket, money_bucket},
    errors::{Error, Result},
    money::Money,
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};

/// Finds an owner's money bucket, if one exists.
pub async fn find_by_user_id<C>(db: &C, user_id: &str) -> Result<Option<money_bucket::Model>>
where
    C: ConnectionTrait,
{
    MoneyBucket::find()
        .filter(money_bucket::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates the owner's money bucket with a zero balance.
pub async fn create<C>(db: &C, user_id: &str) -> Result<money_bucket::Model>
where
    C: ConnectionTrait,
{
    if find_by_user_id(db, user_id).await?.is_some() {
        return Err(Error::Config {
            message: format!("Owner {user_id} already has a money bucket"),
        });
    }

    let now = Utc::now();
    let model = money_bucket::ActiveModel {
        current_value: Set(Money::ZERO),
        total_redistributed: Set(Money::ZERO),
        last_redistribution_at: Set(None),
        user_id: Set(user_id.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Returns the owner's money bucket, creating one with a zero balance if
/// absent.
pub async fn get_or_create<C>(db: &C, user_id: &str) -> Result<money_bucket::Model>
where
    C: ConnectionTrait,
{
    match find_by_user_id(db, user_id).await? {
        Some(existing) => Ok(existing),
        None => create(db, user_id).await,
    }
}

/// Partial update for a money bucket. Unset fields are left unchanged;
/// `id`, `created_at`, and `user_id` are never touched.
#[derive(Debug, Clone, Default)]
pub struct MoneyBucketPatch {
    pub current_value: Option<Money>,
    /// May only grow; the lifetime redistribution counter never decreases.
    pub total_redistributed: Option<Money>,
}

/// Applies a partial update by id. Returns `Ok(None)` when the money bucket
/// does not exist. Rejects a negative balance or any decrease of
/// `total_redistributed`.
pub async fn update<C>(
    db: &C,
    id: i64,
    patch: MoneyBucketPatch,
) -> Result<Option<money_bucket::Model>>
where
    C: ConnectionTrait,
{
    let Some(existing) = MoneyBucket::find_by_id(id).one(db).await? else {
        return Ok(None);
    };

    if let Some(value) = patch.current_value {
        if value.is_negative() {
            return Err(Error::InvalidAmount { amount: value });
        }
    }
    if let Some(total) = patch.total_redistributed {
        if total < existing.total_redistributed {
            return Err(Error::InvalidAmount { amount: total });
        }
    }

    let mut model: money_bucket::ActiveModel = existing.into();
    if let Some(value) = patch.current_value {
        model.current_value = Set(value);
    }
    if let Some(total) = patch.total_redistributed {
        model.total_redistributed = Set(total);
    }
    model.updated_at = Set(Utc::now());

    model.update(db).await.map(Some).map_err(Into::into)
}

/// Sets the money bucket balance. Returns `Ok(None)` when the owner has no
/// money bucket.
pub async fn update_balance<C>(
    db: &C,
    user_id: &str,
    new_value: Money,
) -> Result<Option<money_bucket::Model>>
where
    C: ConnectionTrait,
{
    let Some(existing) = find_by_user_id(db, user_id).await? else {
        return Ok(None);
    };

    if new_value.is_negative() {
        return Err(Error::InvalidAmount { amount: new_value });
    }

    let mut model: money_bucket::ActiveModel = existing.into();
    model.current_value = Set(new_value);
    model.updated_at = Set(Utc::now());

    model.update(db).await.map(Some).map_err(Into::into)
}

/// Increments `total_redistributed` and stamps `last_redistribution_at`.
/// Returns `Ok(None)` when the owner has no money bucket; callers must
/// create one first.
pub async fn add_redistributed<C>(
    db: &C,
    user_id: &str,
    amount: Money,
) -> Result<Option<money_bucket::Model>>
where
    C: ConnectionTrait,
{
    let Some(existing) = find_by_user_id(db, user_id).await? else {
        return Ok(None);
    };

    if amount.is_negative() {
        return Err(Error::InvalidAmount { amount });
    }

    let new_total = existing.total_redistributed + amount;
    let now = Utc::now();

    let mut model: money_bucket::ActiveModel = existing.into();
    model.total_redistributed = Set(new_total);
    model.last_redistribution_at = Set(Some(now));
    model.updated_at = Set(now);

    model.update(db).await.map(Some).map_err(Into::into)
}
