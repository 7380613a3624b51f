use crate::gateway::UpstreamError;
use crate::orchestrator::retry::{RetryOutcome, RetryPolicy, Transient};
use crate::orchestrator::source::SharedRecordSource;
use derive_builder::Builder;
use reap_ingest::{
    PipelineStats, SharedListingStore, StorageError, StoredRecord,
    UpsertOutcome, Validator,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{
    broadcast,
    mpsc::{self, error::TryRecvError},
};
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(usize);

impl WorkerId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Builder, Clone, Debug)]
#[builder(public, setter(into))]
pub struct WorkerOptions {
    /// Retries per item beyond the first attempt.
    #[builder(default = "3")]
    pub max_retries: u32,
    /// Stop the worker after this many items.
    #[builder(default = "None")]
    pub item_budget: Option<usize>,
    /// Spacing between successive fetches against the same source. This
    /// protects the crawled site; the provider rate limiter protects the
    /// metered API. The two are never conflated.
    #[builder(default = "Duration::from_millis(500)")]
    pub politeness_delay: Duration,
    #[builder(default = "Duration::from_secs(30)")]
    pub fetch_timeout: Duration,
    #[builder(default = "Duration::from_millis(500)")]
    pub retry_base_delay: Duration,
    #[builder(default = "Duration::from_secs(10)")]
    pub retry_max_delay: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        WorkerOptionsBuilder::default()
            .build()
            .expect("builder defaults are valid")
    }
}

impl WorkerOptions {
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries + 1,
            base_delay: self.retry_base_delay,
            max_delay: self.retry_max_delay,
        }
    }
}

pub enum WorkerCommand {
    /// Finish the in-flight item, then stop.
    Shutdown,
}

#[derive(thiserror::Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl Transient for WorkerError {
    fn is_transient(&self) -> bool {
        match self {
            WorkerError::Upstream(err) => err.is_transient(),
            // a whole-cycle retry is how storage outages are ridden out
            WorkerError::Storage(_) => true,
        }
    }
}

#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct WorkerStats {
    pub total_execution_time: Duration,
    pub items_processed: usize,
    pub items_stored: usize,
    pub items_rejected: usize,
    pub items_failed: usize,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_execution_time(&mut self, duration: Duration) {
        self.total_execution_time += duration;
        self.items_processed += 1;
    }

    pub fn record_stored(&mut self) {
        self.items_stored += 1;
    }

    pub fn record_rejected(&mut self) {
        self.items_rejected += 1;
    }

    pub fn record_failed(&mut self) {
        self.items_failed += 1;
    }

    pub fn average_execution_time(&self) -> Duration {
        if self.items_processed == 0 {
            return Duration::ZERO;
        }
        self.total_execution_time / self.items_processed as u32
    }
}

enum CycleOutcome {
    Stored(UpsertOutcome),
    Rejected,
    SourceExhausted,
}

/// One fetch → validate → store attempt. Free-standing so the retry policy
/// can re-run it without borrowing the worker across attempts; each retry
/// re-fetches the same item (the source keeps its cursor on failure).
async fn run_cycle(
    source: SharedRecordSource,
    validator: Arc<Validator>,
    store: SharedListingStore,
    stats: Arc<PipelineStats>,
    fetch_timeout: Duration,
) -> Result<CycleOutcome, WorkerError> {
    let fetched = tokio::time::timeout(fetch_timeout, source.fetch_next())
        .await
        .map_err(|_| UpstreamError::Timeout)
        .map_err(WorkerError::from)?;

    let Some(raw) = fetched? else {
        return Ok(CycleOutcome::SourceExhausted);
    };

    match validator.validate(&raw) {
        Ok(validated) => {
            let record = StoredRecord::from_validated(validated, source.name());
            let outcome = store.upsert(record).await?;
            Ok(CycleOutcome::Stored(outcome))
        }
        Err(reason) => {
            // Terminal for this observation: the same input would fail the
            // same way, so it is dropped rather than re-queued.
            warn!("record from {} dropped: {reason}", source.name());
            stats.record_processing_error();
            Ok(CycleOutcome::Rejected)
        }
    }
}

/// Drives one source through the sequential fetch → validate → store
/// pipeline. Individual item failures never stop the worker; it stops on
/// an exhausted source, an exhausted item budget, or a shutdown command.
pub struct Worker {
    worker_id: WorkerId,
    source: SharedRecordSource,
    validator: Arc<Validator>,
    store: SharedListingStore,
    pipeline_stats: Arc<PipelineStats>,
    retry: RetryPolicy,
    pub stats: WorkerStats,
    pub options: WorkerOptions,
}

impl Worker {
    pub fn new(
        worker_id: WorkerId,
        source: SharedRecordSource,
        validator: Arc<Validator>,
        store: SharedListingStore,
        pipeline_stats: Arc<PipelineStats>,
        options: WorkerOptions,
    ) -> Self {
        let retry = options.retry_policy();
        Self {
            worker_id,
            source,
            validator,
            store,
            pipeline_stats,
            retry,
            stats: WorkerStats::new(),
            options,
        }
    }

    pub fn get_stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Process one item. Returns true if the worker should continue.
    pub async fn run(&mut self) -> anyhow::Result<bool> {
        if let Some(budget) = self.options.item_budget {
            if self.stats.items_processed >= budget {
                warn!("item budget reached: {budget}");
                return Ok(false);
            }
        }

        let start_time = std::time::Instant::now();

        let outcome = self
            .retry
            .retry(|| {
                run_cycle(
                    Arc::clone(&self.source),
                    Arc::clone(&self.validator),
                    Arc::clone(&self.store),
                    Arc::clone(&self.pipeline_stats),
                    self.options.fetch_timeout,
                )
            })
            .await;

        match outcome {
            RetryOutcome::Ok(CycleOutcome::SourceExhausted) => {
                info!("source {} exhausted", self.source.name());
                return Ok(false);
            }
            RetryOutcome::Ok(CycleOutcome::Stored(result)) => {
                debug!("stored record from {}: {result:?}", self.source.name());
                self.stats.record_execution_time(start_time.elapsed());
                self.stats.record_stored();
            }
            RetryOutcome::Ok(CycleOutcome::Rejected) => {
                self.stats.record_execution_time(start_time.elapsed());
                self.stats.record_rejected();
            }
            RetryOutcome::Exhausted(err) => {
                error!(
                    "[{}] item dropped after {} attempts: {err}",
                    self.worker_id,
                    self.options.max_retries + 1
                );
                self.pipeline_stats.record_processing_error();
                self.stats.record_execution_time(start_time.elapsed());
                self.stats.record_failed();
            }
            RetryOutcome::Fatal(err) => {
                error!("[{}] item dropped: {err}", self.worker_id);
                self.pipeline_stats.record_processing_error();
                self.stats.record_execution_time(start_time.elapsed());
                self.stats.record_failed();
            }
        }

        tokio::time::sleep(self.options.politeness_delay).await;
        Ok(true)
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("worker_id", &self.worker_id)
            .field("source", &self.source.name())
            .field("options", &self.options)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Runs a worker until it stops on its own or is told to. A `Shutdown`
/// command lets the in-flight fetch/validate/store cycle complete; the
/// terminate broadcast tears the worker down immediately.
#[instrument(fields(worker_id = %worker_id), skip_all)]
pub async fn worker_wrapper(
    worker_id: WorkerId,
    source: SharedRecordSource,
    validator: Arc<Validator>,
    store: SharedListingStore,
    pipeline_stats: Arc<PipelineStats>,
    mut commands: mpsc::Receiver<WorkerCommand>,
    mut terminate: broadcast::Receiver<()>,
    options: WorkerOptions,
) {
    let mut worker = Worker::new(
        worker_id,
        source,
        validator,
        store,
        pipeline_stats,
        options,
    );
    let mut should_stop = false;

    'worker: loop {
        tokio::select! {
            _ = terminate.recv() => {
                info!("terminating immediately");
                return;
            },
            run_result = worker.run(), if !should_stop => {
                match commands.try_recv() {
                    Ok(WorkerCommand::Shutdown) => {
                        warn!("[{}] shutdown received", worker_id);
                        should_stop = true;
                    }
                    Err(TryRecvError::Disconnected) => break 'worker,
                    _ => {}
                }
                match run_result {
                    Ok(true) => {}
                    Ok(false) => break 'worker,
                    Err(err) => {
                        error!("worker failed: {err:?}");
                        break 'worker;
                    }
                }
            }
        };

        // A stop command arrived; the current item already completed.
        if should_stop {
            info!("[{}] completing current item before stopping", worker_id);
            break;
        }
    }

    info!("[{}] stopped: {:?}", worker_id, worker.stats);
}
