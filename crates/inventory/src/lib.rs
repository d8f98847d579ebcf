//! Inventory domain module.
//!
//! This crate contains business rules for catalog items and bins, implemented
//! purely as deterministic domain logic (no IO, no locking, no storage).

pub mod bin;
pub mod item;

pub use bin::{Bin, Quantity};
pub use item::{Item, NewItem};
