//! Durable storage slot access.
//!
//! # Responsibility
//! - Define the whole-value slot contract the store persists through.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Slots are read and written in full; there is no field-level write.
//! - The change marker moves only for commits made by other connections.

pub mod slot_repo;
