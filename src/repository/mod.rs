//! # Execution Repository
//!
//! Persistence boundary for job and step executions. The orchestration layer calls it at every
//! state transition; a database-backed implementation lives outside this crate, and
//! [`InMemoryJobRepository`] covers tests and embedded use.

mod in_memory;

pub use in_memory::InMemoryJobRepository;

use crate::error::BatchResult;
use crate::models::{JobExecution, JobInstance, JobParameters, StepExecution};
use crate::state_machine::BatchStatus;
use async_trait::async_trait;

/// Storage contract for execution records.
///
/// Update calls assign an identity to records that do not have one yet.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Create and persist a new execution for the given instance
    async fn create_job_execution(
        &self,
        job_instance: &JobInstance,
        job_parameters: JobParameters,
    ) -> BatchResult<JobExecution>;

    async fn update_job_execution(&self, job_execution: &mut JobExecution) -> BatchResult<()>;

    async fn update_step_execution(&self, step_execution: &mut StepExecution) -> BatchResult<()>;

    /// Most recent execution of the instance with the given status
    async fn get_last_job_execution(
        &self,
        job_instance: &JobInstance,
        status: BatchStatus,
    ) -> BatchResult<Option<JobExecution>>;

    /// Executions created more than `days` days ago
    async fn find_purgeables(&self, days: u32) -> BatchResult<Vec<JobExecution>>;

    async fn remove(&self, job_executions: &[JobExecution]) -> BatchResult<()>;
}
