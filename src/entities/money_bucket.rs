//! Money bucket entity - the single per-owner overflow account.
//!
//! Deposit funds no bucket claims land here; redistributions move them back
//! out into buckets with room. At most one row exists per owner.

use crate::money::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Money bucket database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "money_buckets")]
pub struct Model {
    /// Unique identifier for the money bucket
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Current balance of unallocated funds
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub current_value: Money,
    /// Cumulative amount ever moved out to buckets; never decreases
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total_redistributed: Money,
    /// When funds last moved out to a bucket
    pub last_redistribution_at: Option<DateTimeUtc>,
    /// Opaque owner identifier
    pub user_id: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
