//! Ordered item library: records, positional mutation and JSON persistence.

pub mod item;
pub mod library;

pub use item::Item;
pub use library::{ItemStore, LoadOutcome};
