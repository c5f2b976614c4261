//! # Execution Records
//!
//! Mutable run records and the static configuration they refer to.
//!
//! - [`JobInstance`] - stored job configuration (connector, type, raw parameters)
//! - [`JobExecution`] - one run of a job; owns its [`StepExecution`]s
//! - [`StepExecution`] - one run of one step: counters, warnings, failures, summary
//! - [`ExecutionContext`] - untyped key/value bag shared between orchestration layers
//! - [`Warning`] / [`FailureException`] - plain-data diagnostic records

pub mod execution_context;
pub mod failure;
pub mod job_execution;
pub mod job_instance;
pub mod job_parameters;
pub mod step_execution;
pub mod warning;

pub use execution_context::ExecutionContext;
pub use failure::FailureException;
pub use job_execution::{JobExecution, StopHandle};
pub use job_instance::{JobInstance, JobInstanceStatus, TYPE_EXPORT, TYPE_IMPORT};
pub use job_parameters::JobParameters;
pub use step_execution::StepExecution;
pub use warning::Warning;
