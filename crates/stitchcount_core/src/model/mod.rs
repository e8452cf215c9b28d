//! Domain model for projects, sections and the replicated store document.
//!
//! # Responsibility
//! - Define the records persisted in the durable storage slot.
//! - Provide template and example data used on first run.
//!
//! # Invariants
//! - Only `StoreDocument` is persisted; timer runtime state never lives here.
//! - A `Section` is owned by exactly one `Project`.

pub mod id;
pub mod project;
pub mod templates;
