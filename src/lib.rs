#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Batch Core
//!
//! Batch job execution engine: sequential job/step orchestration over a chunked
//! read → process → write item pipeline, with a status algebra that decides how runs end.
//!
//! ## Module Organization
//!
//! - [`state_machine`] - `BatchStatus` severity order and `ExitStatus` algebra
//! - [`models`] - Execution records: job/step executions, context, warnings, failures
//! - [`job`] - The job orchestrator, working directories and parameter defaults
//! - [`step`] - The step lifecycle template and the chunked item step
//! - [`item`] - Reader, processor and writer contracts
//! - [`repository`] - Persistence contract and an in-memory implementation
//! - [`events`] - Lifecycle events, dispatcher contract and a broadcast publisher
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use batch_core::events::EventPublisher;
//! use batch_core::job::Job;
//! use batch_core::models::{JobInstance, JobParameters};
//! use batch_core::repository::{InMemoryJobRepository, JobRepository};
//! use std::sync::Arc;
//!
//! # async fn example() -> batch_core::BatchResult<()> {
//! let repository = Arc::new(InMemoryJobRepository::new());
//! let job = Job::new("nightly_export", Arc::new(EventPublisher::default()), repository.clone(), Vec::new());
//!
//! let mut job_execution = repository
//!     .create_job_execution(&JobInstance::default(), JobParameters::default())
//!     .await?;
//! job.execute(&mut job_execution).await;
//!
//! println!("{} -> {}", job, job_execution.exit_status());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod item;
pub mod job;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod repository;
pub mod state_machine;
pub mod step;

pub use config::{BatchConfig, ConfigManager, ConfigurationError};
pub use error::{BatchError, BatchResult};
pub use events::{BatchEvent, EventDispatcher, EventPublisher, NoopDispatcher};
pub use item::{InvalidItem, ItemProcessor, ItemReader, ItemWriter};
pub use job::{Job, JobParametersFactory, WorkingDirectory};
pub use models::{
    ExecutionContext, FailureException, JobExecution, JobInstance, JobParameters, StepExecution,
    StopHandle, Warning,
};
pub use normalizer::JobInstanceNormalizer;
pub use repository::{InMemoryJobRepository, JobRepository};
pub use state_machine::{BatchStatus, ExitCode, ExitStatus};
pub use step::{ItemStep, Step, StepExecutor, StepWork};
