use crate::gateway::UpstreamError;
use async_trait::async_trait;
use reap_ingest::RawRecord;
use std::sync::Arc;

/// One acquisition source: a crawl spider over a listings site, or a
/// buyer/seller/refinance lead agent wrapping a provider API (usually via
/// the caching gateway).
///
/// `fetch_next` yields the next raw observation, or `None` once the source
/// is exhausted. A failed call must leave the source's cursor unchanged so
/// the caller can retry the same item.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Identifies the source in storage metadata and logs.
    fn name(&self) -> &str;

    async fn fetch_next(&self) -> Result<Option<RawRecord>, UpstreamError>;
}

pub type SharedRecordSource = Arc<dyn RecordSource + Send + Sync>;
