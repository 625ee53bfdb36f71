//! Touchline cache.
//!
//! Read-through caching of third-party football data with per-volatility freshness:
//!
//! - **Policy**: decides whether a stored payload may still be served
//! - **Store**: durable key-value rows behind [`crate::application::repos::CacheEntriesRepo`]
//! - **Orchestrator**: cache-aside lookups with stale fallback
//! - **Scope**: per-request deduplication of identical lookups
//! - **Batch**: paced, bounded-concurrency bulk lookups
//!
//! ## Configuration
//!
//! TTLs and batch pacing come from the `[cache]` table of `touchline.toml`:
//!
//! ```toml
//! [cache]
//! aggregate_ttl_secs = 86400
//! injuries_ttl_secs = 3600
//! batch_size = 10
//! batch_pacing_ms = 50
//! # ... see config.rs for all options
//! ```

mod batch;
mod config;
mod lookup;
mod orchestrator;
mod policy;
mod scope;
mod store;

pub use batch::{BatchOutcome, BatchReport, BatchScheduler};
pub use config::CacheConfig;
pub use lookup::{CacheLookup, LookupSource};
pub use orchestrator::CacheOrchestrator;
pub use policy::{FreshnessPolicy, Verdict};
pub use scope::RequestScope;
pub use store::CacheStore;
