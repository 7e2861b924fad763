//! Core business logic - framework-agnostic allocation, ledger, and
//! repository operations. Everything here is async, returns the crate
//! `Result`, and runs against any `ConnectionTrait` implementor so the same
//! code serves live connections and open transactions.

/// Bucket repository - CRUD, ordered retrieval, balance state, reordering
pub mod bucket;
/// Deposit allocation engine
pub mod deposit;
/// Append-only ledger store for deposit events and balance-change entries
pub mod ledger;
/// Per-owner write serialization
pub mod locks;
/// Money bucket repository - the single-per-owner overflow account
pub mod money_bucket;
/// Redistribution from the money bucket into buckets
pub mod redistribute;
/// Reorder coordinator - atomic priority rewrites
pub mod reorder;
/// Withdrawals and transfers, with hold-floor enforcement
pub mod transfer;
