//! Everything an acquisition binary usually needs.

pub use crate::gateway::{
    CachingGateway, GatewayError, ProviderFetch, UpstreamError,
};
pub use crate::limiter::RateLimiter;
pub use crate::orchestrator::{
    worker_wrapper, RecordSource, RetryOutcome, RetryPolicy,
    SharedRecordSource, Supervisor, SupervisorOptions,
    SupervisorOptionsBuilder, Transient, Worker, WorkerCommand, WorkerError,
    WorkerId, WorkerOptions, WorkerOptionsBuilder, WorkerStats,
};
pub use reap_cache::{
    CacheEntry, CacheError, CacheKey, CacheStore, FsCacheStore,
    InMemoryCacheStore, SharedCacheStore,
};
pub use reap_config::{ConfigError, Configurable, ProviderConfig};
pub use reap_ingest::{
    Filter, InMemoryListingStore, ListingStore, PipelineStats, RawRecord,
    SharedListingStore, StatsSnapshot, StorageError, StoredRecord,
    UpsertOutcome, ValidatedRecord, ValidationRejection, ValidationRules,
    Validator,
};
