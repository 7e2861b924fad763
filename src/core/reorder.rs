//! Reorder coordinator - atomic priority rewrites.
//!
//! Validates a batch of `{bucket_id, new_index}` assignments against the
//! owner's bucket collection before anything is written: every id must
//! belong to the owner, no id may appear twice, and the indexes resulting
//! from applying the batch must be unique across the collection. Priority
//! order determines allocation order, so a half-applied batch would corrupt
//! allocations, not just displays - the rewrite itself runs inside one
//! transaction.

use crate::{
    core::{
        bucket,
        bucket::ReorderAssignment,
        locks::OwnerLocks,
    },
    entities::bucket as bucket_entity,
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument};

/// Atomically reassigns priority indexes for one owner's buckets.
///
/// Returns the owner's full bucket collection in the new allocation order.
/// Fails with `BucketNotFound` when an assignment references a bucket the
/// owner does not have, and `IndexConflict` on duplicate ids in the batch,
/// negative indexes, or a resulting duplicate index.
#[instrument(skip(db, locks))]
pub async fn reorder_buckets(
    db: &DatabaseConnection,
    locks: &OwnerLocks,
    user_id: &str,
    assignments: &[ReorderAssignment],
) -> Result<Vec<bucket_entity::Model>> {
    let _guard = locks.acquire(user_id).await;

    let owned = bucket::find_by_user_id(db, user_id).await?;
    if assignments.is_empty() {
        return Ok(owned);
    }

    let mut resulting: HashMap<i64, i32> =
        owned.iter().map(|b| (b.id, b.priority_index)).collect();

    let mut seen_ids = HashSet::new();
    for assignment in assignments {
        if assignment.new_index < 0 {
            return Err(Error::IndexConflict {
                index: assignment.new_index,
            });
        }
        if !resulting.contains_key(&assignment.bucket_id) {
            return Err(Error::BucketNotFound {
                id: assignment.bucket_id,
            });
        }
        if !seen_ids.insert(assignment.bucket_id) {
            return Err(Error::IndexConflict {
                index: assignment.new_index,
            });
        }
        resulting.insert(assignment.bucket_id, assignment.new_index);
    }

    let mut used = HashSet::new();
    for index in resulting.values() {
        if !used.insert(*index) {
            return Err(Error::IndexConflict { index: *index });
        }
    }

    let txn = db.begin().await?;
    bucket::reorder(&txn, assignments).await?;
    txn.commit()
        .await
        .map_err(|source| Error::TransactionFailed { source })?;

    info!(user_id, reassigned = assignments.len(), "bucket priorities rewritten");

    bucket::find_by_user_id(db, user_id).await
}
