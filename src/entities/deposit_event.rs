//! Deposit event entity - one inbound funding event.
//!
//! Records the raw deposit, the portion routed to the money bucket, and the
//! total actually processed (equal to the raw amount for a well-formed
//! deposit). Immutable once created.

use crate::money::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Deposit event database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deposit_events")]
pub struct Model {
    /// Unique identifier for the deposit event
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The raw deposit amount
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub original_amount: Money,
    /// Sum actually allocated across buckets and the money bucket
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total_processed: Money,
    /// The portion routed to the overflow account
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub money_bucket_amount: Money,
    /// Opaque owner identifier
    pub user_id: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
