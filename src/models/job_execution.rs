use super::execution_context::ExecutionContext;
use super::failure::FailureException;
use super::job_instance::JobInstance;
use super::job_parameters::JobParameters;
use super::step_execution::StepExecution;
use crate::constants::WORKING_DIRECTORY_PARAMETER;
use crate::error::BatchError;
use crate::state_machine::{BatchStatus, ExitStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle used to request a cooperative stop of a running job execution.
///
/// The job execution is exclusively borrowed while it runs, so a stop request coming from
/// another task or a listener goes through this handle. Steps observe it at their next
/// unit-of-work boundary.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Run record of one job execution and the step executions it owns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecution {
    id: Option<i64>,
    job_instance: JobInstance,
    job_parameters: Arc<JobParameters>,
    status: BatchStatus,
    exit_status: ExitStatus,
    execution_context: ExecutionContext,
    create_time: DateTime<Utc>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    updated_time: Option<DateTime<Utc>>,
    step_executions: Vec<StepExecution>,
    failure_exceptions: Vec<FailureException>,
    pid: Option<u32>,
    user: Option<String>,
    log_file: Option<String>,
    #[serde(skip)]
    stop_handle: StopHandle,
}

impl JobExecution {
    pub fn new(job_instance: JobInstance, job_parameters: JobParameters) -> Self {
        Self {
            id: None,
            job_instance,
            job_parameters: Arc::new(job_parameters),
            status: BatchStatus::Starting,
            exit_status: ExitStatus::unknown(),
            execution_context: ExecutionContext::new(),
            create_time: Utc::now(),
            start_time: None,
            end_time: None,
            updated_time: None,
            step_executions: Vec::new(),
            failure_exceptions: Vec::new(),
            pid: None,
            user: None,
            log_file: None,
            stop_handle: StopHandle::default(),
        }
    }

    /// Copy with identity reset, for restarts. The copy gets its own stop handle.
    pub fn restart_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.id = None;
        copy.stop_handle = StopHandle::default();
        let stop_handle = copy.stop_handle.clone();
        copy.step_executions = self
            .step_executions
            .iter()
            .map(|step_execution| {
                let mut step_copy = step_execution.restart_copy();
                step_copy.set_stop_handle(stop_handle.clone());
                step_copy
            })
            .collect();
        copy
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn set_id(&mut self, id: i64) -> &mut Self {
        self.id = Some(id);
        for step_execution in &mut self.step_executions {
            step_execution.set_job_execution_id(Some(id));
        }
        self
    }

    pub fn job_instance(&self) -> &JobInstance {
        &self.job_instance
    }

    pub fn set_job_instance(&mut self, job_instance: JobInstance) -> &mut Self {
        self.job_instance = job_instance;
        self
    }

    /// Label of the job instance
    pub fn label(&self) -> &str {
        self.job_instance.label()
    }

    pub fn job_parameters(&self) -> &JobParameters {
        &self.job_parameters
    }

    pub fn set_job_parameters(&mut self, job_parameters: JobParameters) {
        self.job_parameters = Arc::new(job_parameters);
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
        self.exit_status = exit_status;
        self
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

    pub fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    pub fn set_create_time(&mut self, create_time: DateTime<Utc>) -> &mut Self {
        self.create_time = create_time;
        self
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn set_start_time(&mut self, start_time: DateTime<Utc>) -> &mut Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn set_end_time(&mut self, end_time: DateTime<Utc>) -> &mut Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn updated_time(&self) -> Option<DateTime<Utc>> {
        self.updated_time
    }

    pub fn set_updated_time(&mut self, updated_time: DateTime<Utc>) -> &mut Self {
        self.updated_time = Some(updated_time);
        self
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn set_pid(&mut self, pid: u32) -> &mut Self {
        self.pid = Some(pid);
        self
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn set_user(&mut self, user: impl Into<String>) -> &mut Self {
        self.user = Some(user.into());
        self
    }

    pub fn log_file(&self) -> Option<&str> {
        self.log_file.as_deref()
    }

    pub fn set_log_file(&mut self, log_file: impl Into<String>) -> &mut Self {
        self.log_file = Some(log_file.into());
        self
    }

    pub fn step_executions(&self) -> &[StepExecution] {
        &self.step_executions
    }

    pub fn step_executions_mut(&mut self) -> &mut [StepExecution] {
        &mut self.step_executions
    }

    /// Register a new step execution on this job execution and return it.
    ///
    /// The step shares the job parameters and the stop handle, and sees the job's
    /// working directory in its own execution context.
    pub fn create_step_execution(&mut self, step_name: impl Into<String>) -> &mut StepExecution {
        let mut step_execution = StepExecution::new(
            step_name,
            self.id,
            Arc::clone(&self.job_parameters),
            self.stop_handle.clone(),
        );

        if let Some(working_directory) = self.execution_context.get(WORKING_DIRECTORY_PARAMETER) {
            step_execution
                .execution_context_mut()
                .put(WORKING_DIRECTORY_PARAMETER, working_directory.clone());
        }

        self.step_executions.push(step_execution);
        let index = self.step_executions.len() - 1;
        &mut self.step_executions[index]
    }

    /// Swap in a newer snapshot of a step execution, matched by identity
    pub(crate) fn replace_step_execution(&mut self, step_execution: StepExecution) {
        let existing = self
            .step_executions
            .iter_mut()
            .find(|candidate| candidate.id().is_some() && candidate.id() == step_execution.id());

        match existing {
            Some(existing) => *existing = step_execution,
            None => self.step_executions.push(step_execution),
        }
    }

    /// True until the end time is set
    pub fn is_running(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn is_stopping(&self) -> bool {
        self.status == BatchStatus::Stopping
    }

    /// Signal every step execution to terminate at its next boundary
    pub fn stop(&mut self) -> &mut Self {
        for step_execution in &mut self.step_executions {
            step_execution.set_terminate_only();
        }
        self.stop_handle.stop();
        self
    }

    /// Handle for requesting a stop while the execution is borrowed by a running job
    pub fn stop_handle(&self) -> StopHandle {
        self.stop_handle.clone()
    }

    pub fn failure_exceptions(&self) -> &[FailureException] {
        &self.failure_exceptions
    }

    pub fn add_failure_exception(&mut self, error: &BatchError) -> &mut Self {
        self.failure_exceptions.push(FailureException::from(error));
        self
    }

    /// Job-level failures followed by every step's failures, in step order
    pub fn all_failure_exceptions(&self) -> Vec<&FailureException> {
        self.failure_exceptions
            .iter()
            .chain(
                self.step_executions
                    .iter()
                    .flat_map(|step_execution| step_execution.failure_exceptions()),
            )
            .collect()
    }

    /// RFC 3339 rendering of an optional date, empty when absent
    pub fn format_date(date: Option<DateTime<Utc>>) -> String {
        date.map(|date| date.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn job_execution() -> JobExecution {
        let mut instance = JobInstance::new(
            Some("connector".into()),
            Some("import".into()),
            Some("csv_import".into()),
        );
        instance.set_label("CSV import");
        JobExecution::new(instance, JobParameters::default())
    }

    #[test]
    fn test_create_step_execution_registers_it() {
        let mut execution = job_execution();
        execution.set_id(9);
        execution.create_step_execution("read");
        execution.create_step_execution("write");

        let names: Vec<_> = execution
            .step_executions()
            .iter()
            .map(StepExecution::step_name)
            .collect();
        assert_eq!(names, ["read", "write"]);
        assert_eq!(execution.step_executions()[0].job_execution_id(), Some(9));
    }

    #[test]
    fn test_step_execution_sees_working_directory() {
        let mut execution = job_execution();
        execution
            .execution_context_mut()
            .put(WORKING_DIRECTORY_PARAMETER, "/tmp/batch_x/");
        let step = execution.create_step_execution("read");
        assert_eq!(
            step.execution_context().get_str(WORKING_DIRECTORY_PARAMETER),
            Some("/tmp/batch_x/")
        );
    }

    #[test]
    fn test_running_and_stopping() {
        let mut execution = job_execution();
        assert!(execution.is_running());
        assert!(!execution.is_stopping());

        execution.set_status(BatchStatus::Stopping);
        assert!(execution.is_stopping());

        execution.set_end_time(Utc::now());
        assert!(!execution.is_running());
    }

    #[test]
    fn test_stop_marks_every_step() {
        let mut execution = job_execution();
        execution.create_step_execution("a");
        execution.create_step_execution("b");
        execution.stop();
        assert!(execution
            .step_executions()
            .iter()
            .all(StepExecution::is_terminate_only));
        assert!(execution.stop_handle().is_stop_requested());
    }

    #[test]
    fn test_all_failure_exceptions_in_step_order() {
        let mut execution = job_execution();
        execution.add_failure_exception(&BatchError::failure("job level"));
        execution
            .create_step_execution("a")
            .add_failure_exception(&BatchError::failure("step a"));
        execution
            .create_step_execution("b")
            .add_failure_exception(&BatchError::failure("step b"));

        let messages: Vec<_> = execution
            .all_failure_exceptions()
            .iter()
            .map(|failure| failure.message.clone())
            .collect();
        assert_eq!(messages, ["job level", "step a", "step b"]);
    }

    #[test]
    fn test_label_and_format_date() {
        let execution = job_execution();
        assert_eq!(execution.label(), "CSV import");
        assert_eq!(JobExecution::format_date(None), "");

        let date = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(
            JobExecution::format_date(Some(date)),
            "2023-01-01T12:00:00Z"
        );
    }

    #[test]
    fn test_restart_copy_gets_fresh_identity() {
        let mut execution = job_execution();
        execution.set_id(3);
        execution.create_step_execution("a").set_id(4);
        execution.stop_handle().stop();

        let copy = execution.restart_copy();
        assert_eq!(copy.id(), None);
        assert_eq!(copy.step_executions()[0].id(), None);
        assert!(!copy.stop_handle().is_stop_requested());
    }
}
