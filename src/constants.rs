//! # System Constants
//!
//! Event names, execution context keys and defaults shared across the batch engine.

/// Execution context key holding the per-run working directory path
pub const WORKING_DIRECTORY_PARAMETER: &str = "working_directory";

/// Lifecycle event names dispatched by jobs and steps
pub mod events {
    // Job lifecycle events
    pub const BEFORE_JOB_EXECUTION: &str = "batch.before_job_execution";
    pub const AFTER_JOB_EXECUTION: &str = "batch.after_job_execution";
    pub const JOB_EXECUTION_STOPPED: &str = "batch.job_execution_stopped";
    pub const JOB_EXECUTION_INTERRUPTED: &str = "batch.job_execution_interrupted";
    pub const JOB_EXECUTION_FATAL_ERROR: &str = "batch.job_execution_fatal_error";
    pub const BEFORE_JOB_STATUS_UPGRADE: &str = "batch.before_job_status_upgrade";

    // Step lifecycle events
    pub const BEFORE_STEP_EXECUTION: &str = "batch.before_step_execution";
    pub const AFTER_STEP_EXECUTION: &str = "batch.after_step_execution";
    pub const STEP_EXECUTION_SUCCEEDED: &str = "batch.step_execution_succeeded";
    pub const STEP_EXECUTION_INTERRUPTED: &str = "batch.step_execution_interrupted";
    pub const STEP_EXECUTION_ERRORED: &str = "batch.step_execution_errored";

    // Item events
    pub const INVALID_ITEM: &str = "batch.invalid_item";
}

/// Execution defaults, overridable through configuration
pub mod defaults {
    /// Items buffered before each write
    pub const BATCH_SIZE: usize = 100;

    /// Prefix of per-run working directories
    pub const WORKING_DIRECTORY_PREFIX: &str = "batch_";

    /// Capacity of the event publisher broadcast channel
    pub const EVENT_CHANNEL_CAPACITY: usize = 1000;

    /// Description attached to runs that executed no step
    pub const NOOP_DESCRIPTION: &str =
        "All steps already completed or no steps configured for this job.";
}
