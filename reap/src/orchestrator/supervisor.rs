use crate::orchestrator::source::SharedRecordSource;
use crate::orchestrator::worker::{
    worker_wrapper, WorkerCommand, WorkerId, WorkerOptions,
};
use derive_builder::Builder;
use reap_ingest::{PipelineStats, SharedListingStore, Validator};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use tokio::{
    signal,
    sync::{broadcast, mpsc},
};
use tracing::Instrument;

type WorkerCommandSenders =
    Arc<Mutex<HashMap<WorkerId, mpsc::Sender<WorkerCommand>>>>;

#[derive(Builder, Default, Clone, Debug)]
#[builder(public, setter(into))]
pub struct SupervisorOptions {
    #[builder(default = "WorkerOptions::default()")]
    pub worker_options: WorkerOptions,
}

/// Supervises the acquisition fleet: one worker per source, all feeding the
/// same listing store and sharing one stats collector.
pub struct Supervisor {
    pub sources: Vec<SharedRecordSource>,
    pub validator: Arc<Validator>,
    pub store: SharedListingStore,
    pub stats: Arc<PipelineStats>,
    pub options: SupervisorOptions,
}

impl Supervisor {
    pub fn new(
        sources: Vec<SharedRecordSource>,
        validator: Validator,
        store: SharedListingStore,
        stats: Arc<PipelineStats>,
        options: SupervisorOptions,
    ) -> Self {
        Self {
            sources,
            validator: Arc::new(validator),
            store,
            stats,
            options,
        }
    }

    /// Run every worker to completion, handling shutdown signals along the
    /// way. One Ctrl-C asks workers to finish their in-flight item and
    /// stop; a second terminates them immediately.
    pub async fn run_workers(&mut self) {
        let mut worker_handlers = Vec::new();
        let command_senders: WorkerCommandSenders =
            Arc::new(Mutex::new(HashMap::new()));
        let (terminate_sender, _) = broadcast::channel::<()>(10);

        for (i, source) in self.sources.iter().enumerate() {
            let worker_id = WorkerId::new(i + 1);
            let (command_sender, command_receiver) =
                mpsc::channel::<WorkerCommand>(100);

            command_senders
                .lock()
                .expect("command sender map poisoned")
                .insert(worker_id, command_sender);
            let terminate_receiver = terminate_sender.subscribe();

            let worker_span = tracing::info_span!(
                "worker",
                worker_id = %worker_id,
                source = source.name()
            );
            let worker = tokio::spawn(
                worker_wrapper(
                    worker_id,
                    Arc::clone(source),
                    Arc::clone(&self.validator),
                    Arc::clone(&self.store),
                    Arc::clone(&self.stats),
                    command_receiver,
                    terminate_receiver,
                    self.options.worker_options.clone(),
                )
                .instrument(worker_span),
            );
            worker_handlers.push(worker);
        }

        self.ctrl_c_handler(command_senders, terminate_sender).await;

        for (worker_id, handler) in worker_handlers.into_iter().enumerate() {
            let worker_id = worker_id + 1;
            match handler.await {
                Ok(()) => {
                    tracing::info!("[{}] worker stopped", worker_id);
                }
                Err(err) => {
                    tracing::error!(
                        "[{}] fatal error in one of the workers: {:?}",
                        worker_id,
                        err
                    );
                }
            }
        }

        tracing::info!(
            "all workers stopped; pipeline stats: {:?}",
            self.stats.snapshot()
        );
    }

    // First Ctrl-C sends a graceful stop to every worker; the next one
    // broadcasts an immediate terminate.
    async fn ctrl_c_handler(
        &mut self,
        command_senders: WorkerCommandSenders,
        terminate_sender: broadcast::Sender<()>,
    ) {
        let ctrl_c_counter = Arc::new(AtomicUsize::new(0));
        let signal_counter = ctrl_c_counter.clone();
        let command_senders = command_senders.clone();

        tokio::spawn(async move {
            loop {
                signal::ctrl_c()
                    .await
                    .expect("Failed to listen for ctrl+c event");
                let count = signal_counter.fetch_add(1, Ordering::SeqCst);

                match count {
                    0 => {
                        tracing::warn!(
                            "Ctrl+C received, sending stop command to all workers..."
                        );
                        let senders: Vec<_> = {
                            let lock = command_senders
                                .lock()
                                .expect("command sender map poisoned");
                            lock.values().cloned().collect()
                        };
                        for sender in senders {
                            let _ = sender.send(WorkerCommand::Shutdown).await;
                        }
                    }
                    _ => {
                        tracing::warn!(
                            "Ctrl+C received again, terminating all workers..."
                        );
                        let _ = terminate_sender.send(());
                        break;
                    }
                }
            }
        });
    }
}
