use super::StepWork;
use crate::error::{BatchError, BatchResult};
use crate::events::{BatchEvent, EventDispatcher};
use crate::logging::log_step_operation;
use crate::models::StepExecution;
use crate::repository::JobRepository;
use crate::state_machine::{BatchStatus, ExitCode, ExitStatus};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Lifecycle template shared by every step.
///
/// Runs a [`StepWork`] between the before/after events, maps its outcome onto the step's
/// status and exit status, and persists the step execution at each transition.
#[derive(Clone)]
pub struct StepExecutor {
    name: String,
    dispatcher: Arc<dyn EventDispatcher>,
    repository: Arc<dyn JobRepository>,
}

impl StepExecutor {
    pub fn new(
        name: impl Into<String>,
        dispatcher: Arc<dyn EventDispatcher>,
        repository: Arc<dyn JobRepository>,
    ) -> Self {
        Self {
            name: name.into(),
            dispatcher,
            repository,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dispatcher(&self) -> &dyn EventDispatcher {
        self.dispatcher.as_ref()
    }

    pub fn repository(&self) -> &dyn JobRepository {
        self.repository.as_ref()
    }

    /// Run `work` inside the step lifecycle
    #[instrument(skip_all, fields(step_name = %self.name, step_execution_id = step_execution.id()))]
    pub async fn execute(
        &self,
        work: &dyn StepWork,
        step_execution: &mut StepExecution,
    ) -> BatchResult<()> {
        // Phase 1: Announce and mark started
        self.dispatcher
            .dispatch(&BatchEvent::BeforeStepExecution(step_execution));
        step_execution.set_start_time(Utc::now());
        step_execution.set_status(BatchStatus::Started);
        self.repository.update_step_execution(step_execution).await?;

        log_step_operation(
            "execute",
            step_execution.job_execution_id(),
            step_execution.id(),
            Some(&self.name),
            BatchStatus::Started.as_str(),
            None,
        );

        // Phase 2: Run the work and map its outcome
        let mut exit_status = ExitStatus::executing();
        match self.run_work(work, step_execution, &mut exit_status).await {
            Ok(()) => {
                step_execution.upgrade_status(BatchStatus::Completed);
                debug!(
                    read_count = step_execution.read_count(),
                    write_count = step_execution.write_count(),
                    "Step execution succeeded"
                );
                self.dispatcher
                    .dispatch(&BatchEvent::StepExecutionSuccess(step_execution));
            }
            Err(err) => {
                step_execution.upgrade_status(failure_status(&err));
                exit_status = exit_status.logical_and(&exit_status_for_failure(&err));
                step_execution.add_failure_exception(&err);
                self.repository.update_step_execution(step_execution).await?;

                if step_execution.status() == BatchStatus::Stopped {
                    warn!(reason = %err, "Step execution interrupted");
                    self.dispatcher
                        .dispatch(&BatchEvent::StepExecutionInterrupted(step_execution));
                } else {
                    error!(error = %err, error_type = err.type_name(), "Step execution failed");
                    self.dispatcher
                        .dispatch(&BatchEvent::StepExecutionErrored(step_execution));
                }
            }
        }

        // Phase 3: Finalize
        self.dispatcher
            .dispatch(&BatchEvent::AfterStepExecution(step_execution));
        step_execution.set_end_time(Utc::now());
        step_execution.set_exit_status(exit_status);
        self.repository.update_step_execution(step_execution).await?;

        log_step_operation(
            "execute",
            step_execution.job_execution_id(),
            step_execution.id(),
            Some(&self.name),
            step_execution.status().as_str(),
            Some(step_execution.exit_code()),
        );

        Ok(())
    }

    async fn run_work(
        &self,
        work: &dyn StepWork,
        step_execution: &mut StepExecution,
        exit_status: &mut ExitStatus,
    ) -> BatchResult<()> {
        work.do_execute(step_execution).await?;

        *exit_status = ExitStatus::completed().logical_and(step_execution.exit_status());
        self.repository.update_step_execution(step_execution).await?;

        // Stop requested while the work was running
        if step_execution.is_terminate_only() {
            return Err(BatchError::interrupted("JobExecution interrupted."));
        }

        Ok(())
    }
}

impl fmt::Debug for StepExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepExecutor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Status a failed unit of work moves its execution to
pub(crate) fn failure_status(err: &BatchError) -> BatchStatus {
    if err.is_interruption() {
        BatchStatus::Stopped
    } else {
        BatchStatus::Failed
    }
}

/// Exit status recorded for a failed unit of work
pub(crate) fn exit_status_for_failure(err: &BatchError) -> ExitStatus {
    if err.is_interruption() {
        ExitStatus::with_description(ExitCode::Stopped, err.type_name())
    } else {
        let mut exit_status = ExitStatus::failed();
        exit_status.add_exit_description_from_error(err);
        exit_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopDispatcher;
    use crate::models::{JobInstance, JobParameters};
    use crate::repository::InMemoryJobRepository;
    use async_trait::async_trait;

    struct ScriptedWork(fn() -> BatchResult<()>);

    #[async_trait]
    impl StepWork for ScriptedWork {
        async fn do_execute(&self, _step_execution: &mut StepExecution) -> BatchResult<()> {
            (self.0)()
        }
    }

    async fn run(work: ScriptedWork) -> StepExecution {
        let repository = Arc::new(InMemoryJobRepository::new());
        let mut job_execution = repository
            .create_job_execution(&JobInstance::default(), JobParameters::default())
            .await
            .unwrap();

        let executor = StepExecutor::new("step", Arc::new(NoopDispatcher), repository);
        let step_execution = job_execution.create_step_execution("step");
        executor.execute(&work, step_execution).await.unwrap();
        step_execution.clone()
    }

    #[tokio::test]
    async fn test_successful_work_completes() {
        let step_execution = run(ScriptedWork(|| Ok(()))).await;

        assert_eq!(step_execution.status(), BatchStatus::Completed);
        assert_eq!(step_execution.exit_status().exit_code(), &ExitCode::Completed);
        assert!(step_execution.end_time().is_some());
        assert!(step_execution.failure_exceptions().is_empty());
    }

    #[tokio::test]
    async fn test_failing_work_is_recorded() {
        let step_execution =
            run(ScriptedWork(|| Err(BatchError::failure("reader exploded")))).await;

        assert_eq!(step_execution.status(), BatchStatus::Failed);
        assert_eq!(step_execution.exit_status().exit_code(), &ExitCode::Failed);
        assert!(step_execution.exit_description().contains("reader exploded"));
        assert_eq!(step_execution.failure_exceptions().len(), 1);
    }

    #[tokio::test]
    async fn test_interrupted_work_stops() {
        let step_execution =
            run(ScriptedWork(|| Err(BatchError::interrupted("stop now")))).await;

        assert_eq!(step_execution.status(), BatchStatus::Stopped);
        assert_eq!(step_execution.exit_status().exit_code(), &ExitCode::Stopped);
        assert_eq!(
            step_execution.exit_description(),
            "batch_core::JobInterrupted"
        );
    }

    #[test]
    fn test_wrapped_interruption_maps_to_stopped() {
        let wrapped =
            BatchError::runtime_caused_by("wrapper", 0, BatchError::interrupted("inner"));

        assert_eq!(failure_status(&wrapped), BatchStatus::Stopped);
        assert_eq!(
            exit_status_for_failure(&wrapped).exit_code(),
            &ExitCode::Stopped
        );
    }
}
