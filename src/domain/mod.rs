//! Domain layer types and invariants.

pub mod entry;
pub mod error;
pub mod fixture;
pub mod keys;
pub mod season;
