//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod bucket;
pub mod bucket_entry;
pub mod deposit_event;
pub mod money_bucket;
pub mod money_bucket_entry;

// Re-export specific types to avoid conflicts
pub use bucket::{
    Column as BucketColumn, Entity as Bucket, FilterMethod, HoldType, Model as BucketModel,
};
pub use bucket_entry::{
    Column as BucketEntryColumn, Entity as BucketEntry, Model as BucketEntryModel, TransactionType,
};
pub use deposit_event::{
    Column as DepositEventColumn, Entity as DepositEvent, Model as DepositEventModel,
};
pub use money_bucket::{
    Column as MoneyBucketColumn, Entity as MoneyBucket, Model as MoneyBucketModel,
};
pub use money_bucket_entry::{
    Column as MoneyBucketEntryColumn, Entity as MoneyBucketEntry, Model as MoneyBucketEntryModel,
    MoneyBucketTransactionType,
};
