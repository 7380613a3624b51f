//! # reap - Real-Estate Acquisition Pipeline
//!
//! `reap` is the reliability scaffolding around acquiring property listings
//! from flaky, throttled, partially-trustworthy sources: quota-limited
//! third-party APIs and crawled web listings. It does not parse pages or
//! route HTTP requests; it makes sure that whatever a spider or lead agent
//! observes ends up validated, deduplicated, and durably persisted at
//! minimum quota cost.
//!
//! ## Components
//!
//! - **Caching gateway** ([`gateway`]): sits in front of every external API
//!   call; serves from the disk-persisted cache when it can, and
//!   rate-limits the live call when it cannot.
//! - **Rate limiter** ([`limiter`]): at most one live call per provider per
//!   configured interval. Cache hits never touch it.
//! - **Ingestion pipeline** ([`ingest`]): validation rules turn raw scraped
//!   records into typed ones or drop them with a reason; the listing store
//!   upserts them idempotently, keyed by URL, with optimistic concurrency
//!   so stale retries never overwrite newer data.
//! - **Orchestrator** ([`orchestrator`]): one worker per source, each a
//!   sequential fetch → validate → store loop with bounded, backed-off
//!   retries, an item budget, and a politeness delay; a supervisor handles
//!   spawning and graceful shutdown.
//!
//! Check the demos!

pub mod gateway;
pub mod limiter;
pub mod orchestrator;
pub mod prelude;

pub use reap_cache as cache;
pub use reap_config as config;
pub use reap_ingest as ingest;
#[cfg(feature = "http")]
pub use reap_config::backoff;
#[cfg(feature = "http")]
pub use reqwest;

// re-export
pub use anyhow;
pub use async_trait;
pub use chrono;
pub use rand;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tokio;
pub use tracing;
pub use tracing_subscriber;
