//! Deposit allocation engine.
//!
//! Fans one inbound deposit out across the owner's buckets in priority order
//! and routes whatever no bucket claims into the money bucket, recording one
//! deposit event plus one ledger entry per touched account - all inside a
//! single transaction under the owner's write lock. Either every row of a
//! deposit run commits or none do.
//!
//! Claim rule per non-locked, non-full bucket, in ascending priority order:
//! `min(filter share, remaining, room)`, where the filter share is the
//! bucket's flat `filter_value` or `filter_value%` of the *original* deposit
//! amount, and room is `target_value - current_value`. A bucket's minimum
//! hold never reduces an incoming claim; holds only constrain outflow.

use crate::{
    core::{
        bucket, ledger,
        ledger::{NewBucketEntry, NewDepositEvent, NewMoneyBucketEntry},
        locks::OwnerLocks,
        money_bucket,
    },
    entities::{
        FilterMethod, MoneyBucketTransactionType, TransactionType, bucket as bucket_entity,
        bucket_entry, deposit_event, money_bucket as money_bucket_entity, money_bucket_entry,
    },
    errors::{Error, Result},
    money::Money,
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{debug, info, instrument};

/// Everything a deposit run produced.
#[derive(Debug, Clone)]
pub struct DepositOutcome {
    /// The recorded deposit event.
    pub event: deposit_event::Model,
    /// One entry per bucket that claimed a share, in allocation order.
    pub bucket_entries: Vec<bucket_entry::Model>,
    /// The overflow entry, present when any remainder reached the money
    /// bucket.
    pub money_bucket_entry: Option<money_bucket_entry::Model>,
    /// The owner's money bucket after the run.
    pub money_bucket: money_bucket_entity::Model,
}

/// How much of `remaining` this bucket claims, floored at zero.
fn claim_for(bucket: &bucket_entity::Model, amount: Money, remaining: Money) -> Money {
    let share = match bucket.filter_method {
        FilterMethod::FlatValue => Money::new(bucket.filter_value),
        FilterMethod::Percentage => amount.percent(bucket.filter_value),
    };
    share.min(remaining).min(bucket.room())
}

/// Processes one deposit for an owner.
///
/// Fails with `InvalidAmount` unless `amount > 0`, and with `OwnerNotFound`
/// when the owner has neither buckets nor a money bucket. A missing money
/// bucket for a known owner is created with a zero balance as part of the
/// run. By construction `sum(claims) + money_bucket_amount == amount`
/// exactly.
#[instrument(skip(db, locks))]
pub async fn process_deposit(
    db: &DatabaseConnection,
    locks: &OwnerLocks,
    user_id: &str,
    amount: Money,
) -> Result<DepositOutcome> {
    if !amount.is_positive() {
        return Err(Error::InvalidAmount { amount });
    }

    let _guard = locks.acquire(user_id).await;
    let txn = db.begin().await?;

    let buckets = bucket::find_by_user_id(&txn, user_id).await?;
    let existing = money_bucket::find_by_user_id(&txn, user_id).await?;
    if buckets.is_empty() && existing.is_none() {
        return Err(Error::OwnerNotFound {
            user_id: user_id.to_string(),
        });
    }
    let mb = match existing {
        Some(mb) => mb,
        None => money_bucket::create(&txn, user_id).await?,
    };

    // Plan the whole fan-out before writing anything.
    let mut remaining = amount;
    let mut planned = Vec::new();
    for b in buckets {
        if !remaining.is_positive() {
            break;
        }
        if b.is_locked || b.is_full {
            continue;
        }
        let claim = claim_for(&b, amount, remaining);
        if claim.is_positive() {
            remaining = remaining.sub(claim)?;
            planned.push((b, claim));
        }
    }
    let money_bucket_amount = remaining;

    let event = ledger::record_deposit_event(
        &txn,
        NewDepositEvent {
            user_id: user_id.to_string(),
            original_amount: amount,
            total_processed: amount,
            money_bucket_amount,
        },
    )
    .await?;

    let mut bucket_entries = Vec::with_capacity(planned.len());
    for (b, claim) in planned {
        let balance_before = b.current_value;
        let balance_after = balance_before + claim;
        let was_filled = balance_before < b.target_value && balance_after >= b.target_value;

        bucket::update_bucket_state(&txn, b.id, balance_after)
            .await?
            .ok_or(Error::BucketNotFound { id: b.id })?;

        bucket_entries.push(
            ledger::record_bucket_entry(
                &txn,
                NewBucketEntry {
                    user_id: user_id.to_string(),
                    bucket_id: b.id,
                    deposit_event_id: Some(event.id),
                    amount: claim,
                    balance_before,
                    balance_after,
                    was_filled,
                    transaction_type: TransactionType::Deposit,
                },
            )
            .await?,
        );
        debug!(bucket_id = b.id, claim = %claim, was_filled, "bucket claimed deposit share");
    }

    let mut money_bucket_entry = None;
    let mut money_bucket = mb;
    if money_bucket_amount.is_positive() {
        let balance_before = money_bucket.current_value;
        let balance_after = balance_before + money_bucket_amount;

        money_bucket = money_bucket::update_balance(&txn, user_id, balance_after)
            .await?
            .ok_or_else(|| Error::MoneyBucketNotFound {
                user_id: user_id.to_string(),
            })?;

        money_bucket_entry = Some(
            ledger::record_money_bucket_entry(
                &txn,
                NewMoneyBucketEntry {
                    user_id: user_id.to_string(),
                    money_bucket_id: money_bucket.id,
                    deposit_event_id: Some(event.id),
                    target_bucket_id: None,
                    amount: money_bucket_amount,
                    balance_before,
                    balance_after,
                    transaction_type: MoneyBucketTransactionType::Deposit,
                },
            )
            .await?,
        );
    }

    txn.commit()
        .await
        .map_err(|source| Error::TransactionFailed { source })?;

    info!(
        user_id,
        deposit = %amount,
        claimed_by_buckets = bucket_entries.len(),
        to_money_bucket = %money_bucket_amount,
        "deposit processed"
    );

    Ok(DepositOutcome {
        event,
        bucket_entries,
        money_bucket_entry,
        money_bucket,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use crate::{core::bucket::NewBucket, pagination::PaginationOptions};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_deposit_fans_out_in_priority_order() -> Result<()> {
        // A (flat 100, target 500, current 450) and B (10%, target 1000,
        // current 0). Deposit 200: A claims min(100, 200, 50) = 50 and
        // fills; B claims min(20, 150, 1000) = 20; 130 overflows.
        let (db, locks) = setup_test_engine().await?;

        let a = bucket::create(
            &db,
            NewBucket {
                current_value: Some(Money::new(dec!(450.00))),
                ..test_bucket_spec("user1", "A", 0)
            },
        )
        .await?;
        let b = bucket::create(
            &db,
            NewBucket {
                target_value: Money::new(dec!(1000.00)),
                filter_method: FilterMethod::Percentage,
                filter_value: dec!(10),
                ..test_bucket_spec("user1", "B", 1)
            },
        )
        .await?;

        let outcome = process_deposit(&db, &locks, "user1", Money::new(dec!(200.00))).await?;

        assert_eq!(outcome.event.original_amount, Money::new(dec!(200.00)));
        assert_eq!(outcome.event.total_processed, Money::new(dec!(200.00)));
        assert_eq!(outcome.event.money_bucket_amount, Money::new(dec!(130.00)));

        assert_eq!(outcome.bucket_entries.len(), 2);
        let first = &outcome.bucket_entries[0];
        assert_eq!(first.bucket_id, a.id);
        assert_eq!(first.amount, Money::new(dec!(50.00)));
        assert_eq!(first.balance_before, Money::new(dec!(450.00)));
        assert_eq!(first.balance_after, Money::new(dec!(500.00)));
        assert!(first.was_filled);

        let second = &outcome.bucket_entries[1];
        assert_eq!(second.bucket_id, b.id);
        assert_eq!(second.amount, Money::new(dec!(20.00)));
        assert!(!second.was_filled);

        let a_after = bucket::find_by_id(&db, a.id).await?.unwrap();
        assert!(a_after.is_full);
        assert_eq!(a_after.current_value, Money::new(dec!(500.00)));

        assert_eq!(
            outcome.money_bucket.current_value,
            Money::new(dec!(130.00))
        );
        let mb_entry = outcome.money_bucket_entry.unwrap();
        assert_eq!(mb_entry.amount, Money::new(dec!(130.00)));
        assert_eq!(mb_entry.deposit_event_id, Some(outcome.event.id));

        // The whole fan-out is reachable from the event.
        let event = ledger::find_deposit_event_by_id(&db, outcome.event.id)
            .await?
            .unwrap();
        assert_eq!(event.money_bucket_amount, Money::new(dec!(130.00)));
        let fanned_out = ledger::bucket_entries_for_deposit_event(&db, event.id).await?;
        assert_eq!(fanned_out.len(), 2);
        let overflow = ledger::money_bucket_entries_for_deposit_event(&db, event.id).await?;
        assert_eq!(overflow.len(), 1);

        assert_owner_invariant(&db, "user1").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_query() -> Result<()> {
        // A mock connection with no scripted results: reaching the database
        // at all would fail this test.
        use sea_orm::{DatabaseBackend, MockDatabase};
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let locks = OwnerLocks::new();

        let result = process_deposit(&db, &locks, "user1", Money::ZERO).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_deposit_rejects_non_positive_amounts() -> Result<()> {
        let (db, locks) = setup_test_engine().await?;
        create_test_bucket(&db, "user1", "A", 0).await?;

        for bad in [Money::ZERO, Money::new(dec!(-5.00))] {
            let result = process_deposit(&db, &locks, "user1", bad).await;
            assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));
        }

        // Nothing was recorded.
        let events =
            ledger::deposit_events_for_user(&db, "user1", &PaginationOptions::default()).await?;
        assert_eq!(events.total, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_deposit_for_unknown_owner() -> Result<()> {
        let (db, locks) = setup_test_engine().await?;

        let result = process_deposit(&db, &locks, "nobody", Money::new(dec!(10.00))).await;
        assert!(matches!(result.unwrap_err(), Error::OwnerNotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_deposit_with_no_buckets_goes_to_money_bucket() -> Result<()> {
        let (db, locks) = setup_test_engine().await?;
        money_bucket::create(&db, "user1").await?;

        let outcome = process_deposit(&db, &locks, "user1", Money::new(dec!(75.25))).await?;
        assert!(outcome.bucket_entries.is_empty());
        assert_eq!(outcome.event.money_bucket_amount, Money::new(dec!(75.25)));
        assert_eq!(outcome.money_bucket.current_value, Money::new(dec!(75.25)));

        Ok(())
    }

    #[tokio::test]
    async fn test_deposit_creates_missing_money_bucket() -> Result<()> {
        let (db, locks) = setup_test_engine().await?;
        create_test_bucket(&db, "user1", "A", 0).await?;

        assert!(money_bucket::find_by_user_id(&db, "user1").await?.is_none());
        process_deposit(&db, &locks, "user1", Money::new(dec!(40.00))).await?;

        let mb = money_bucket::find_by_user_id(&db, "user1").await?.unwrap();
        // Flat filter 100 swallows the whole deposit; the money bucket exists
        // but holds nothing.
        assert_eq!(mb.current_value, Money::ZERO);

        Ok(())
    }

    #[tokio::test]
    async fn test_locked_and_full_buckets_never_claim() -> Result<()> {
        let (db, locks) = setup_test_engine().await?;

        let locked = bucket::create(
            &db,
            NewBucket {
                is_locked: true,
                ..test_bucket_spec("user1", "Locked", 0)
            },
        )
        .await?;
        let full = bucket::create(
            &db,
            NewBucket {
                current_value: Some(Money::new(dec!(500.00))),
                ..test_bucket_spec("user1", "Full", 1)
            },
        )
        .await?;
        let open = create_test_bucket(&db, "user1", "Open", 2).await?;

        let outcome = process_deposit(&db, &locks, "user1", Money::new(dec!(60.00))).await?;

        assert_eq!(outcome.bucket_entries.len(), 1);
        assert_eq!(outcome.bucket_entries[0].bucket_id, open.id);

        let locked_after = bucket::find_by_id(&db, locked.id).await?.unwrap();
        assert_eq!(locked_after.current_value, Money::ZERO);
        let full_after = bucket::find_by_id(&db, full.id).await?.unwrap();
        assert_eq!(full_after.current_value, Money::new(dec!(500.00)));

        Ok(())
    }

    #[tokio::test]
    async fn test_percentage_claims_conserve_exactly() -> Result<()> {
        let (db, locks) = setup_test_engine().await?;

        // Awkward percentages that truncate: 33.33% of 100.01 = 33.33,
        // 7.77% of 100.01 = 7.77 (both truncated toward zero).
        for (name, pct, index) in [("A", dec!(33.33), 0), ("B", dec!(7.77), 1)] {
            bucket::create(
                &db,
                NewBucket {
                    target_value: Money::new(dec!(10000.00)),
                    filter_method: FilterMethod::Percentage,
                    filter_value: pct,
                    ..test_bucket_spec("user1", name, index)
                },
            )
            .await?;
        }

        let amount = Money::new(dec!(100.01));
        let outcome = process_deposit(&db, &locks, "user1", amount).await?;

        let claimed: Money = outcome
            .bucket_entries
            .iter()
            .fold(Money::ZERO, |acc, e| acc + e.amount);
        assert_eq!(claimed + outcome.event.money_bucket_amount, amount);

        assert_owner_invariant(&db, "user1").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_repeated_deposits_preserve_invariant_and_replay() -> Result<()> {
        let (db, locks) = setup_test_engine().await?;

        let a = bucket::create(
            &db,
            NewBucket {
                target_value: Money::new(dec!(120.00)),
                filter_value: dec!(50.00),
                ..test_bucket_spec("user1", "A", 0)
            },
        )
        .await?;
        bucket::create(
            &db,
            NewBucket {
                filter_method: FilterMethod::Percentage,
                filter_value: dec!(25),
                ..test_bucket_spec("user1", "B", 1)
            },
        )
        .await?;

        for amount in [dec!(80.00), dec!(33.34), dec!(250.01)] {
            process_deposit(&db, &locks, "user1", Money::new(amount)).await?;
        }

        assert_owner_invariant(&db, "user1").await?;
        assert_bucket_ledger_replays(&db, a.id).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_deposits_for_one_owner_serialize() -> Result<()> {
        let (db, locks) = setup_test_engine().await?;
        bucket::create(
            &db,
            NewBucket {
                target_value: Money::new(dec!(1000.00)),
                filter_value: dec!(30.00),
                ..test_bucket_spec("user1", "A", 0)
            },
        )
        .await?;

        let deposit = Money::new(dec!(50.00));
        let (r1, r2, r3) = tokio::join!(
            process_deposit(&db, &locks, "user1", deposit),
            process_deposit(&db, &locks, "user1", deposit),
            process_deposit(&db, &locks, "user1", deposit),
        );
        r1?;
        r2?;
        r3?;

        assert_owner_invariant(&db, "user1").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_uncommitted_run_leaves_no_rows() -> Result<()> {
        // The engine's atomicity comes from the transaction boundary; prove
        // that a partial run which never commits leaves nothing behind.
        let (db, _locks) = setup_test_engine().await?;
        let b = create_test_bucket(&db, "user1", "A", 0).await?;

        {
            let txn = db.begin().await?;
            bucket::update_bucket_state(&txn, b.id, Money::new(dec!(90.00))).await?;
            ledger::record_bucket_entry(
                &txn,
                NewBucketEntry {
                    user_id: "user1".to_string(),
                    bucket_id: b.id,
                    deposit_event_id: None,
                    amount: Money::new(dec!(90.00)),
                    balance_before: Money::ZERO,
                    balance_after: Money::new(dec!(90.00)),
                    was_filled: false,
                    transaction_type: TransactionType::Deposit,
                },
            )
            .await?;
            // Dropped without commit: rolls back.
        }

        let after = bucket::find_by_id(&db, b.id).await?.unwrap();
        assert_eq!(after.current_value, Money::ZERO);
        let entries =
            ledger::bucket_entries_for_user(&db, "user1", &PaginationOptions::default()).await?;
        assert_eq!(entries.total, 0);

        Ok(())
    }
}
