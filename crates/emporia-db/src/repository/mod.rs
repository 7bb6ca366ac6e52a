//! # Repository Module
//!
//! Repository implementations for database access.
//!
//! Each repository owns the SQL for one aggregate; the multi-aggregate
//! sale and transfer flows own their transaction boundary here too, so
//! callers never see a half-applied mutation.
//!
//! - [`stock`] - Owner master inventory
//! - [`shop`] - Shops, per-shop stock, transfer ledger
//! - [`order`] - Online checkout and POS sale transactions
//! - [`history`] - Append-only per-user sales ledger
//! - [`user`] - User identities (role + tier columns)
//! - [`message`] - Broadcast messages and read receipts

pub mod history;
pub mod message;
pub mod order;
pub mod shop;
pub mod stock;
pub mod user;
