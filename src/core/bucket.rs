//! Bucket repository - read and write paths for bucket records.
//!
//! Provides ordered and paginated lookups, creation with validation, partial
//! updates, balance-state updates, batch priority rewrites, and deletion.
//! The `is_full` flag is derived state: every path that touches
//! `current_value` or `target_value` recomputes it here, so callers never
//! set it directly.

use crate::{
    entities::{Bucket, FilterMethod, HoldType, bucket},
    errors::{Error, Result},
    money::Money,
    pagination::{Page, PaginationOptions, SortDirection},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Set, prelude::*};

/// Column to order a paginated bucket listing by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BucketOrderField {
    #[default]
    PriorityIndex,
    Name,
    CreatedAt,
    CurrentValue,
}

impl BucketOrderField {
    fn column(self) -> bucket::Column {
        match self {
            Self::PriorityIndex => bucket::Column::PriorityIndex,
            Self::Name => bucket::Column::Name,
            Self::CreatedAt => bucket::Column::CreatedAt,
            Self::CurrentValue => bucket::Column::CurrentValue,
        }
    }
}

/// Everything needed to create a bucket.
#[derive(Debug, Clone)]
pub struct NewBucket {
    pub user_id: String,
    pub name: String,
    pub target_value: Money,
    /// Defaults to zero when unspecified.
    pub current_value: Option<Money>,
    pub priority_index: i32,
    pub filter_method: FilterMethod,
    pub filter_value: Decimal,
    pub has_minimum_hold: bool,
    pub hold_type: Option<HoldType>,
    pub hold_value: Option<Decimal>,
    pub is_locked: bool,
}

/// Partial update for a bucket. Unset fields are left unchanged; `id`,
/// `created_at`, and `user_id` are never touched. Hold settings are disabled
/// by setting `has_minimum_hold` to false rather than by clearing the values.
#[derive(Debug, Clone, Default)]
pub struct BucketPatch {
    pub name: Option<String>,
    pub target_value: Option<Money>,
    pub current_value: Option<Money>,
    pub priority_index: Option<i32>,
    pub filter_method: Option<FilterMethod>,
    pub filter_value: Option<Decimal>,
    pub has_minimum_hold: Option<bool>,
    pub hold_type: Option<HoldType>,
    pub hold_value: Option<Decimal>,
    pub is_locked: Option<bool>,
}

/// One priority reassignment in a reorder batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderAssignment {
    pub bucket_id: i64,
    pub new_index: i32,
}

/// Finds a bucket by its unique ID.
pub async fn find_by_id<C>(db: &C, id: i64) -> Result<Option<bucket::Model>>
where
    C: ConnectionTrait,
{
    Bucket::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Retrieves all of an owner's buckets in allocation order: ascending
/// `priority_index`, ties broken by creation order.
pub async fn find_by_user_id<C>(db: &C, user_id: &str) -> Result<Vec<bucket::Model>>
where
    C: ConnectionTrait,
{
    Bucket::find()
        .filter(bucket::Column::UserId.eq(user_id))
        .order_by_asc(bucket::Column::PriorityIndex)
        .order_by_asc(bucket::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Same ordering as [`find_by_user_id`], excluding locked buckets.
pub async fn find_active_by_user_id<C>(db: &C, user_id: &str) -> Result<Vec<bucket::Model>>
where
    C: ConnectionTrait,
{
    Bucket::find()
        .filter(bucket::Column::UserId.eq(user_id))
        .filter(bucket::Column::IsLocked.eq(false))
        .order_by_asc(bucket::Column::PriorityIndex)
        .order_by_asc(bucket::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Paginated bucket listing for an owner.
pub async fn find_by_user_id_paginated(
    db: &DatabaseConnection,
    user_id: &str,
    options: &PaginationOptions,
    order_by: BucketOrderField,
) -> Result<Page<bucket::Model>> {
    let total = Bucket::find()
        .filter(bucket::Column::UserId.eq(user_id))
        .count(db)
        .await?;

    let query = Bucket::find().filter(bucket::Column::UserId.eq(user_id));
    let query = match options.direction() {
        SortDirection::Asc => query.order_by_asc(order_by.column()),
        SortDirection::Desc => query.order_by_desc(order_by.column()),
    };

    let items = query
        .order_by_asc(bucket::Column::Id)
        .limit(options.limit())
        .offset(options.offset())
        .all(db)
        .await?;

    Ok(Page::new(items, total, options.limit(), options.offset()))
}

fn validate_spec(spec: &NewBucket) -> Result<()> {
    if spec.name.trim().is_empty() {
        return Err(Error::Config {
            message: "Bucket name cannot be empty".to_string(),
        });
    }

    if spec.target_value.is_negative() {
        return Err(Error::InvalidAmount {
            amount: spec.target_value,
        });
    }

    if spec.current_value.is_some_and(|v| v.is_negative()) {
        return Err(Error::InvalidAmount {
            amount: spec.current_value.unwrap_or(Money::ZERO),
        });
    }

    if spec.priority_index < 0 {
        return Err(Error::IndexConflict {
            index: spec.priority_index,
        });
    }

    validate_rate(spec.filter_method, spec.filter_value)?;

    if spec.has_minimum_hold {
        let (Some(hold_type), Some(hold_value)) = (spec.hold_type, spec.hold_value) else {
            return Err(Error::Config {
                message: "Buckets with a minimum hold need both hold_type and hold_value"
                    .to_string(),
            });
        };
        let method = match hold_type {
            HoldType::FlatValue => FilterMethod::FlatValue,
            HoldType::Percentage => FilterMethod::Percentage,
        };
        validate_rate(method, hold_value)?;
    }

    Ok(())
}

fn validate_rate(method: FilterMethod, value: Decimal) -> Result<()> {
    let out_of_range = match method {
        FilterMethod::FlatValue => value.is_sign_negative() && !value.is_zero(),
        FilterMethod::Percentage => {
            (value.is_sign_negative() && !value.is_zero()) || value > Decimal::ONE_HUNDRED
        }
    };

    if out_of_range {
        return Err(Error::InvalidAmount {
            amount: Money::new(value),
        });
    }
    Ok(())
}

/// Creates a new bucket. The balance defaults to zero and `is_full` is
/// computed at creation.
pub async fn create<C>(db: &C, spec: NewBucket) -> Result<bucket::Model>
where
    C: ConnectionTrait,
{
    validate_spec(&spec)?;

    let now = Utc::now();
    let current_value = spec.current_value.unwrap_or(Money::ZERO);

    let model = bucket::ActiveModel {
        name: Set(spec.name.trim().to_string()),
        target_value: Set(spec.target_value),
        current_value: Set(current_value),
        priority_index: Set(spec.priority_index),
        filter_method: Set(spec.filter_method),
        filter_value: Set(spec.filter_value),
        has_minimum_hold: Set(spec.has_minimum_hold),
        hold_type: Set(spec.hold_type),
        hold_value: Set(spec.hold_value),
        is_locked: Set(spec.is_locked),
        is_full: Set(bucket::Model::compute_is_full(
            current_value,
            spec.target_value,
        )),
        user_id: Set(spec.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Applies a partial update. Returns `Ok(None)` when the bucket does not
/// exist. `is_full` is recomputed whenever the patch touches `current_value`
/// or `target_value`.
pub async fn update<C>(db: &C, id: i64, patch: BucketPatch) -> Result<Option<bucket::Model>>
where
    C: ConnectionTrait,
{
    let Some(existing) = Bucket::find_by_id(id).one(db).await? else {
        return Ok(None);
    };

    let target_value = patch.target_value.unwrap_or(existing.target_value);
    let current_value = patch.current_value.unwrap_or(existing.current_value);
    if target_value.is_negative() || current_value.is_negative() {
        return Err(Error::InvalidAmount {
            amount: if target_value.is_negative() {
                target_value
            } else {
                current_value
            },
        });
    }

    let mut model: bucket::ActiveModel = existing.into();
    if let Some(name) = patch.name {
        if name.trim().is_empty() {
            return Err(Error::Config {
                message: "Bucket name cannot be empty".to_string(),
            });
        }
        model.name = Set(name.trim().to_string());
    }
    if let Some(priority_index) = patch.priority_index {
        if priority_index < 0 {
            return Err(Error::IndexConflict {
                index: priority_index,
            });
        }
        model.priority_index = Set(priority_index);
    }
    if let Some(filter_method) = patch.filter_method {
        model.filter_method = Set(filter_method);
    }
    if let Some(filter_value) = patch.filter_value {
        model.filter_value = Set(filter_value);
    }
    if let Some(has_minimum_hold) = patch.has_minimum_hold {
        model.has_minimum_hold = Set(has_minimum_hold);
    }
    if let Some(hold_type) = patch.hold_type {
        model.hold_type = Set(Some(hold_type));
    }
    if let Some(hold_value) = patch.hold_value {
        model.hold_value = Set(Some(hold_value));
    }
    if let Some(is_locked) = patch.is_locked {
        model.is_locked = Set(is_locked);
    }
    model.target_value = Set(target_value);
    model.current_value = Set(current_value);
    model.is_full = Set(bucket::Model::compute_is_full(current_value, target_value));
    model.updated_at = Set(Utc::now());

    model.update(db).await.map(Some).map_err(Into::into)
}

/// Sets a bucket's balance and recomputes `is_full` against its target.
/// Returns `Ok(None)` when the bucket does not exist.
pub async fn update_bucket_state<C>(
    db: &C,
    id: i64,
    new_value: Money,
) -> Result<Option<bucket::Model>>
where
    C: ConnectionTrait,
{
    let Some(existing) = Bucket::find_by_id(id).one(db).await? else {
        return Ok(None);
    };

    if new_value.is_negative() {
        return Err(Error::InvalidAmount { amount: new_value });
    }

    let target_value = existing.target_value;
    let mut model: bucket::ActiveModel = existing.into();
    model.current_value = Set(new_value);
    model.is_full = Set(bucket::Model::compute_is_full(new_value, target_value));
    model.updated_at = Set(Utc::now());

    model.update(db).await.map(Some).map_err(Into::into)
}

/// Rewrites the priority index of every bucket in the batch.
///
/// Must run inside the caller's transaction: a missing bucket aborts the
/// whole batch with `BucketNotFound`, and the transaction boundary is what
/// turns that abort into "no index changed". The reorder coordinator
/// validates ownership and index uniqueness before calling this.
pub async fn reorder<C>(db: &C, assignments: &[ReorderAssignment]) -> Result<Vec<bucket::Model>>
where
    C: ConnectionTrait,
{
    let mut updated = Vec::with_capacity(assignments.len());

    for assignment in assignments {
        let existing = Bucket::find_by_id(assignment.bucket_id)
            .one(db)
            .await?
            .ok_or(Error::BucketNotFound {
                id: assignment.bucket_id,
            })?;

        let mut model: bucket::ActiveModel = existing.into();
        model.priority_index = Set(assignment.new_index);
        model.updated_at = Set(Utc::now());
        updated.push(model.update(db).await?);
    }

    Ok(updated)
}

/// Deletes a bucket. Ledger entries referencing it are retained.
pub async fn delete<C>(db: &C, id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Bucket::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}
