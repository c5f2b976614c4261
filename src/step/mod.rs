//! # Steps
//!
//! A [`Step`] is one stage of a job. Most steps are built from a [`StepExecutor`], which owns the
//! lifecycle (events, status transitions, failure mapping, persistence), and a [`StepWork`]
//! implementation that does the actual processing. [`ItemStep`] is the chunked
//! read/process/write implementation.

pub(crate) mod executor;
mod item_step;

pub use executor::StepExecutor;
pub use item_step::ItemStep;

use crate::error::BatchResult;
use crate::models::StepExecution;
use async_trait::async_trait;

/// Stage of a job, run once per job execution
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    /// Run the step against its execution record.
    ///
    /// Processing failures are recorded on the execution; only persistence failures outside
    /// the recovered region are returned.
    async fn execute(&self, step_execution: &mut StepExecution) -> BatchResult<()>;
}

/// Step-specific processing driven by a [`StepExecutor`]
#[async_trait]
pub trait StepWork: Send + Sync {
    async fn do_execute(&self, step_execution: &mut StepExecution) -> BatchResult<()>;
}
