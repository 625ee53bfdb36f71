//! Infrastructure adapters and runtime bootstrap.

pub mod api_sports;
pub mod db;
pub mod error;
pub mod memory;
pub mod telemetry;
