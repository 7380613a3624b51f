//! Ingestion pipeline for scraped listing records.
//!
//! A crawl spider or lead agent hands this crate raw, untrusted records.
//! The validation stage either normalizes them into typed records or drops
//! them with a reason; the listing store then persists them idempotently,
//! keyed by source URL, so duplicate and out-of-order observations never
//! clobber newer data.

mod memory;
mod record;
mod stats;
mod store;
mod validate;

pub use memory::InMemoryListingStore;
pub use record::{RawRecord, StoredRecord, ValidatedRecord};
pub use stats::{PipelineStats, StatsSnapshot};
pub use store::{
    Filter, ListingStore, SharedListingStore, StorageError, UpsertOutcome,
};
pub use validate::{
    normalize_text, RulesError, ValidationRejection, ValidationRules, Validator,
};
