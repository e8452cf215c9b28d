//! Use-case services layered over the project store.
//!
//! # Responsibility
//! - Offer counter controls that edit the selected section and report the
//!   user interaction to the timer.

pub mod counter_service;
