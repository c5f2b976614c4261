use super::execution_context::ExecutionContext;
use super::failure::FailureException;
use super::job_execution::StopHandle;
use super::job_parameters::JobParameters;
use super::warning::Warning;
use crate::error::BatchError;
use crate::item::InvalidItem;
use crate::state_machine::{BatchStatus, ExitStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Run record of one step within a job execution.
///
/// Only created through [`JobExecution::create_step_execution`](super::JobExecution::create_step_execution),
/// so a step execution always belongs to exactly one job execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecution {
    id: Option<i64>,
    job_execution_id: Option<i64>,
    step_name: String,
    status: BatchStatus,
    read_count: u64,
    write_count: u64,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    execution_context: ExecutionContext,
    exit_status: ExitStatus,
    // denormalized for display
    exit_code: String,
    exit_description: String,
    terminate_only: bool,
    failure_exceptions: Vec<FailureException>,
    errors: Vec<String>,
    warnings: Vec<Warning>,
    summary: Map<String, Value>,
    #[serde(skip)]
    job_parameters: Arc<JobParameters>,
    #[serde(skip)]
    stop_handle: StopHandle,
}

impl StepExecution {
    pub(crate) fn new(
        step_name: impl Into<String>,
        job_execution_id: Option<i64>,
        job_parameters: Arc<JobParameters>,
        stop_handle: StopHandle,
    ) -> Self {
        let exit_status = ExitStatus::executing();
        Self {
            id: None,
            job_execution_id,
            step_name: step_name.into(),
            status: BatchStatus::Starting,
            read_count: 0,
            write_count: 0,
            start_time: Utc::now(),
            end_time: None,
            execution_context: ExecutionContext::new(),
            exit_code: exit_status.exit_code().to_string(),
            exit_description: exit_status.exit_description(),
            exit_status,
            terminate_only: false,
            failure_exceptions: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            summary: Map::new(),
            job_parameters,
            stop_handle,
        }
    }

    /// Copy with identity reset, for restarts
    pub fn restart_copy(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn set_id(&mut self, id: i64) -> &mut Self {
        self.id = Some(id);
        self
    }

    pub fn job_execution_id(&self) -> Option<i64> {
        self.job_execution_id
    }

    pub(crate) fn set_job_execution_id(&mut self, id: Option<i64>) {
        self.job_execution_id = id;
    }

    pub(crate) fn set_stop_handle(&mut self, stop_handle: StopHandle) {
        self.stop_handle = stop_handle;
    }

    pub fn step_name(&self) -> &str {
        &self.step_name
    }

    pub fn job_parameters(&self) -> &JobParameters {
        &self.job_parameters
    }

    pub fn execution_context(&self) -> &ExecutionContext {
        &self.execution_context
    }

    pub fn execution_context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.execution_context
    }

    pub fn set_execution_context(&mut self, execution_context: ExecutionContext) -> &mut Self {
        self.execution_context = execution_context;
        self
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn set_status(&mut self, status: BatchStatus) -> &mut Self {
        self.status = status;
        self
    }

    /// Move to `status` only if it is more severe than the current one
    pub fn upgrade_status(&mut self, status: BatchStatus) -> &mut Self {
        self.status = self.status.upgrade_to(status);
        self
    }

    pub fn exit_status(&self) -> &ExitStatus {
        &self.exit_status
    }

    pub fn set_exit_status(&mut self, exit_status: ExitStatus) -> &mut Self {
        self.exit_code = exit_status.exit_code().to_string();
        self.exit_description = exit_status.exit_description();
        self.exit_status = exit_status;
        self
    }

    pub fn exit_code(&self) -> &str {
        &self.exit_code
    }

    pub fn exit_description(&self) -> &str {
        &self.exit_description
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn set_start_time(&mut self, start_time: DateTime<Utc>) -> &mut Self {
        self.start_time = start_time;
        self
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn set_end_time(&mut self, end_time: DateTime<Utc>) -> &mut Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    pub fn set_read_count(&mut self, read_count: u64) -> &mut Self {
        self.read_count = read_count;
        self
    }

    /// Increment the read count; steps below 1 count as 1
    pub fn increment_read_count(&mut self, step: i64) {
        self.read_count += clamp_step(step);
    }

    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    pub fn set_write_count(&mut self, write_count: u64) -> &mut Self {
        self.write_count = write_count;
        self
    }

    /// Increment the write count; steps below 1 count as 1
    pub fn increment_write_count(&mut self, step: i64) {
        self.write_count += clamp_step(step);
    }

    /// Items read but not written, always derived from the two counters
    pub fn filter_count(&self) -> i64 {
        self.read_count as i64 - self.write_count as i64
    }

    /// Whether this execution, or the job around it, has been asked to stop
    pub fn is_terminate_only(&self) -> bool {
        self.terminate_only || self.stop_handle.is_stop_requested()
    }

    pub fn set_terminate_only(&mut self) -> &mut Self {
        self.terminate_only = true;
        self
    }

    pub fn failure_exceptions(&self) -> &[FailureException] {
        &self.failure_exceptions
    }

    pub fn add_failure_exception(&mut self, error: &BatchError) -> &mut Self {
        self.failure_exceptions.push(FailureException::from(error));
        self
    }

    /// Messages of all recorded failures, separated by a space
    pub fn failure_exception_messages(&self) -> String {
        self.failure_exceptions
            .iter()
            .map(|failure| failure.message.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn add_error(&mut self, message: impl Into<String>) -> &mut Self {
        self.errors.push(message.into());
        self
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Record a warning about an invalid item, storing the item as plain data
    pub fn add_warning(
        &mut self,
        reason: impl Into<String>,
        reason_parameters: Map<String, Value>,
        item: &InvalidItem,
    ) {
        let warning = Warning::new(
            self.id,
            self.step_name.clone(),
            reason,
            reason_parameters,
            item.invalid_data(),
        );
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn add_summary_info(&mut self, key: impl Into<String>, info: impl Into<Value>) {
        self.summary.insert(key.into(), info.into());
    }

    /// Increment a numeric summary counter; steps below 1 count as 1
    pub fn increment_summary_info(&mut self, key: impl Into<String>, step: i64) {
        let step = clamp_step(step);
        let entry = self.summary.entry(key.into()).or_insert(Value::from(0u64));
        let current = entry.as_u64().unwrap_or(0);
        *entry = Value::from(current + step);
    }

    pub fn summary_info(&self, key: &str) -> Option<&Value> {
        self.summary.get(key)
    }

    pub fn summary(&self) -> &Map<String, Value> {
        &self.summary
    }

    pub fn set_summary(&mut self, summary: Map<String, Value>) -> &mut Self {
        self.summary = summary;
        self
    }
}

fn clamp_step(step: i64) -> u64 {
    step.max(1) as u64
}

impl fmt::Display for StepExecution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id={}, name=[{}], status=[{}], exitCode=[{}], exitDescription=[{}]",
            self.id.unwrap_or(0),
            self.step_name,
            self.status.value(),
            self.exit_code,
            self.exit_description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::ExitCode;
    use serde_json::json;

    fn step_execution() -> StepExecution {
        StepExecution::new(
            "myStepName",
            None,
            Arc::new(JobParameters::default()),
            StopHandle::default(),
        )
    }

    #[test]
    fn test_properly_instantiated() {
        let execution = step_execution();
        assert_eq!(execution.status(), BatchStatus::Starting);
        assert_eq!(execution.exit_status().exit_code(), &ExitCode::Executing);
        assert!(execution.execution_context().is_empty());
        assert!(execution.warnings().is_empty());
        assert!(execution.failure_exceptions().is_empty());
        assert!(execution.end_time().is_none());
    }

    #[test]
    fn test_upgrades_status() {
        let mut execution = step_execution();
        execution.upgrade_status(BatchStatus::Completed);
        assert_eq!(execution.status(), BatchStatus::Completed);
        execution.upgrade_status(BatchStatus::Failed);
        assert_eq!(execution.status(), BatchStatus::Failed);
        execution.upgrade_status(BatchStatus::Completed);
        assert_eq!(execution.status(), BatchStatus::Failed);
    }

    #[test]
    fn test_counters_clamp_and_derive_filter_count() {
        let mut execution = step_execution();
        execution.increment_read_count(0);
        execution.increment_read_count(-5);
        execution.increment_read_count(3);
        execution.increment_write_count(2);
        assert_eq!(execution.read_count(), 5);
        assert_eq!(execution.write_count(), 2);
        assert_eq!(execution.filter_count(), 3);
    }

    #[test]
    fn test_increments_summary_info() {
        let mut execution = step_execution();
        execution.increment_summary_info("counter", 1);
        assert_eq!(execution.summary_info("counter"), Some(&json!(1)));
        execution.increment_summary_info("counter", 3);
        assert_eq!(execution.summary_info("counter"), Some(&json!(4)));
    }

    #[test]
    fn test_adds_failure_exception() {
        let mut execution = step_execution();
        execution.add_failure_exception(&BatchError::failure("my msg"));
        execution.add_failure_exception(&BatchError::failure("other"));
        assert_eq!(execution.failure_exceptions().len(), 2);
        assert_eq!(execution.failure_exception_messages(), "my msg other");
    }

    #[test]
    fn test_adds_warning() {
        let mut execution = step_execution();
        execution.add_warning(
            "my reason",
            Map::new(),
            &InvalidItem::object("Product", None, Some("sku-1".into())),
        );
        assert_eq!(execution.warnings().len(), 1);
        assert_eq!(
            execution.warnings()[0].item(),
            &json!({"class": "Product", "id": "[unknown]", "string": "sku-1"})
        );
    }

    #[test]
    fn test_exit_status_is_denormalized() {
        let mut execution = step_execution();
        execution.set_exit_status(ExitStatus::with_description(ExitCode::Failed, "boom"));
        assert_eq!(execution.exit_code(), "FAILED");
        assert_eq!(execution.exit_description(), "boom");
    }

    #[test]
    fn test_terminate_only_follows_stop_handle() {
        let handle = StopHandle::default();
        let execution = StepExecution::new(
            "step",
            None,
            Arc::new(JobParameters::default()),
            handle.clone(),
        );
        assert!(!execution.is_terminate_only());
        handle.stop();
        assert!(execution.is_terminate_only());
    }

    #[test]
    fn test_restart_copy_resets_id() {
        let mut execution = step_execution();
        execution.set_id(5);
        assert_eq!(execution.restart_copy().id(), None);
    }

    #[test]
    fn test_is_displayable() {
        assert_eq!(
            step_execution().to_string(),
            "id=0, name=[myStepName], status=[2], exitCode=[EXECUTING], exitDescription=[]"
        );
    }
}
