use super::working_directory::WorkingDirectory;
use crate::config::ExecutionConfig;
use crate::constants::{defaults, WORKING_DIRECTORY_PARAMETER};
use crate::error::{BatchError, BatchResult};
use crate::events::{BatchEvent, EventDispatcher};
use crate::logging::{log_error, log_job_operation};
use crate::models::JobExecution;
use crate::repository::JobRepository;
use crate::state_machine::{BatchStatus, ExitCode, ExitStatus};
use crate::step::executor::{exit_status_for_failure, failure_status};
use crate::step::Step;
use chrono::Utc;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Ordered sequence of steps run against one job execution at a time.
///
/// Steps run one after another and the job stops at the first step that does not complete.
/// Each run gets its own working directory, exposed to steps through the execution context
/// under [`WORKING_DIRECTORY_PARAMETER`] and removed when the run ends.
pub struct Job {
    name: String,
    dispatcher: Arc<dyn EventDispatcher>,
    repository: Arc<dyn JobRepository>,
    steps: Vec<Arc<dyn Step>>,
    working_directory_root: PathBuf,
    working_directory_prefix: String,
}

impl Job {
    pub fn new(
        name: impl Into<String>,
        dispatcher: Arc<dyn EventDispatcher>,
        repository: Arc<dyn JobRepository>,
        steps: Vec<Arc<dyn Step>>,
    ) -> Self {
        Self {
            name: name.into(),
            dispatcher,
            repository,
            steps,
            working_directory_root: std::env::temp_dir(),
            working_directory_prefix: defaults::WORKING_DIRECTORY_PREFIX.to_string(),
        }
    }

    /// Build a job placing its working directories as configured
    pub fn from_config(
        name: impl Into<String>,
        dispatcher: Arc<dyn EventDispatcher>,
        repository: Arc<dyn JobRepository>,
        steps: Vec<Arc<dyn Step>>,
        config: &ExecutionConfig,
    ) -> Self {
        Self::new(name, dispatcher, repository, steps).with_working_directory(
            config.working_directory_root(),
            config.working_directory_prefix.clone(),
        )
    }

    pub fn with_working_directory(mut self, root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        self.working_directory_root = root.into();
        self.working_directory_prefix = prefix.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Arc<dyn Step>] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&Arc<dyn Step>> {
        self.steps.iter().find(|step| step.name() == name)
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Run every step against `job_execution`.
    ///
    /// The outcome is recorded on the execution (status, exit status, failures); nothing is
    /// returned. The working directory is removed on every path.
    #[instrument(skip_all, fields(job_name = %self.name, job_execution_id = job_execution.id()))]
    pub async fn execute(&self, job_execution: &mut JobExecution) {
        log_job_operation(
            "execute",
            job_execution.id(),
            Some(&self.name),
            job_execution.status().as_str(),
            None,
        );

        let working_directory = match WorkingDirectory::create(
            &self.working_directory_root,
            &self.working_directory_prefix,
        ) {
            Ok(working_directory) => working_directory,
            Err(err) => {
                self.handle_failure(job_execution, err).await;
                return;
            }
        };

        job_execution.execution_context_mut().put(
            WORKING_DIRECTORY_PARAMETER,
            Value::String(working_directory.path().display().to_string()),
        );

        if let Err(err) = self.run(job_execution).await {
            self.handle_failure(job_execution, err).await;
        }

        log_job_operation(
            "execute",
            job_execution.id(),
            Some(&self.name),
            job_execution.status().as_str(),
            Some(job_execution.exit_status().exit_description().as_str()),
        );

        drop(working_directory);
    }

    async fn run(&self, job_execution: &mut JobExecution) -> BatchResult<()> {
        self.dispatcher
            .dispatch(&BatchEvent::BeforeJobExecution(job_execution));

        if job_execution.status() != BatchStatus::Stopping {
            job_execution.set_start_time(Utc::now());
            job_execution.set_status(BatchStatus::Started);
            self.repository.update_job_execution(job_execution).await?;

            self.run_steps(job_execution).await?;
        } else {
            // Stopped before it started
            info!("Job execution was stopped before start");
            job_execution.set_status(BatchStatus::Stopped);
            job_execution.set_exit_status(ExitStatus::completed());
            self.repository.update_job_execution(job_execution).await?;

            self.dispatcher
                .dispatch(&BatchEvent::JobExecutionStopped(job_execution));
        }

        if job_execution.status() <= BatchStatus::Stopped
            && job_execution.step_executions().is_empty()
        {
            let noop = ExitStatus::with_description(ExitCode::Noop, defaults::NOOP_DESCRIPTION);
            let exit_status = job_execution.exit_status().logical_and(&noop);
            job_execution.set_exit_status(exit_status);
            self.repository.update_job_execution(job_execution).await?;
        }

        self.dispatcher
            .dispatch(&BatchEvent::AfterJobExecution(job_execution));
        job_execution.set_end_time(Utc::now());
        self.repository.update_job_execution(job_execution).await?;

        Ok(())
    }

    /// Run steps in order, stopping at the first one that does not complete
    async fn run_steps(&self, job_execution: &mut JobExecution) -> BatchResult<()> {
        let mut last_index = None;

        for step in &self.steps {
            let index = self.handle_step(step.as_ref(), job_execution).await?;
            let step_execution = &mut job_execution.step_executions_mut()[index];
            self.repository.update_step_execution(step_execution).await?;
            last_index = Some(index);

            if step_execution.status() != BatchStatus::Completed {
                debug!(
                    step_name = step.name(),
                    status = %step_execution.status(),
                    "Step did not complete, skipping remaining steps"
                );
                break;
            }
        }

        if let Some(index) = last_index {
            self.dispatcher
                .dispatch(&BatchEvent::BeforeJobStatusUpgrade(job_execution));

            let last = &job_execution.step_executions()[index];
            let (status, exit_status) = (last.status(), last.exit_status().clone());
            job_execution.upgrade_status(status);
            job_execution.set_exit_status(exit_status);
            self.repository.update_job_execution(job_execution).await?;
        }

        Ok(())
    }

    /// Run one step, returning the index of its execution within the job execution
    async fn handle_step(
        &self,
        step: &dyn Step,
        job_execution: &mut JobExecution,
    ) -> BatchResult<usize> {
        if job_execution.is_stopping() || job_execution.stop_handle().is_stop_requested() {
            return Err(BatchError::interrupted("JobExecution interrupted."));
        }

        job_execution.create_step_execution(step.name());
        let index = job_execution.step_executions().len() - 1;
        let step_execution = &mut job_execution.step_executions_mut()[index];

        if let Err(err) = step.execute(step_execution).await {
            if err.is_interruption() {
                step_execution.set_status(BatchStatus::Stopping);
                self.repository.update_step_execution(step_execution).await?;
            }
            return Err(err);
        }

        if matches!(
            step_execution.status(),
            BatchStatus::Stopping | BatchStatus::Stopped
        ) {
            job_execution.set_status(BatchStatus::Stopping);
            self.repository.update_job_execution(job_execution).await?;
            return Err(BatchError::interrupted("Job interrupted by step execution"));
        }

        Ok(index)
    }

    async fn handle_failure(&self, job_execution: &mut JobExecution, err: BatchError) {
        job_execution.set_exit_status(exit_status_for_failure(&err));

        if failure_status(&err) == BatchStatus::Stopped {
            let carried = err.interruption_status().unwrap_or(BatchStatus::Stopped);
            job_execution.set_status(BatchStatus::max(BatchStatus::Stopped, carried));
            job_execution.add_failure_exception(&err);
            warn!(reason = %err, status = %job_execution.status(), "Job execution interrupted");
            self.persist_after_failure(job_execution).await;

            self.dispatcher
                .dispatch(&BatchEvent::JobExecutionInterrupted(job_execution));
        } else {
            job_execution.set_status(BatchStatus::Failed);
            job_execution.add_failure_exception(&err);
            error!(error = %err, error_type = err.type_name(), "Job execution failed");
            self.persist_after_failure(job_execution).await;

            self.dispatcher
                .dispatch(&BatchEvent::JobExecutionFatalError(job_execution));
        }
    }

    async fn persist_after_failure(&self, job_execution: &mut JobExecution) {
        if let Err(err) = self.repository.update_job_execution(job_execution).await {
            log_error(
                "job",
                "update_job_execution",
                &err.to_string(),
                Some(&self.name),
            );
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job: [name={}]", self.name)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("steps", &self.step_names())
            .field("working_directory_root", &self.working_directory_root)
            .finish_non_exhaustive()
    }
}
