pub mod retry;
pub mod source;
pub mod supervisor;
pub mod worker;

pub use retry::{RetryOutcome, RetryPolicy, Transient};
pub use source::{RecordSource, SharedRecordSource};
pub use supervisor::{
    Supervisor, SupervisorOptions, SupervisorOptionsBuilder,
    SupervisorOptionsBuilderError,
};
pub use worker::{
    worker_wrapper, Worker, WorkerCommand, WorkerError, WorkerId, WorkerOptions,
    WorkerOptionsBuilder, WorkerOptionsBuilderError, WorkerStats,
};
