use super::JobRepository;
use crate::error::{BatchError, BatchResult};
use crate::models::{JobExecution, JobInstance, JobParameters, StepExecution};
use crate::state_machine::BatchStatus;
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Debug, Default)]
struct RepositoryState {
    last_job_instance_id: i64,
    last_job_execution_id: i64,
    last_step_execution_id: i64,
    /// Instance identities keyed by instance code
    job_instance_ids: HashMap<String, i64>,
    job_executions: BTreeMap<i64, JobExecution>,
}

impl RepositoryState {
    fn next_job_execution_id(&mut self) -> i64 {
        self.last_job_execution_id += 1;
        self.last_job_execution_id
    }

    fn next_step_execution_id(&mut self) -> i64 {
        self.last_step_execution_id += 1;
        self.last_step_execution_id
    }

    fn job_instance_id(&mut self, job_instance: &JobInstance) -> i64 {
        if let Some(id) = job_instance.id() {
            self.last_job_instance_id = self.last_job_instance_id.max(id);
            return id;
        }

        if let Some(id) = self.job_instance_ids.get(job_instance.code()) {
            return *id;
        }

        self.last_job_instance_id += 1;
        let id = self.last_job_instance_id;
        self.job_instance_ids
            .insert(job_instance.code().to_string(), id);
        id
    }
}

/// Process-local repository storing snapshots of every persisted execution
#[derive(Debug, Default)]
pub struct InMemoryJobRepository {
    state: RwLock<RepositoryState>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last persisted snapshot of a job execution
    pub fn job_execution(&self, id: i64) -> Option<JobExecution> {
        self.state.read().job_executions.get(&id).cloned()
    }

    /// All stored snapshots, oldest identity first
    pub fn job_executions(&self) -> Vec<JobExecution> {
        self.state.read().job_executions.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().job_executions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().job_executions.is_empty()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create_job_execution(
        &self,
        job_instance: &JobInstance,
        job_parameters: JobParameters,
    ) -> BatchResult<JobExecution> {
        let mut state = self.state.write();

        let mut job_instance = job_instance.clone();
        let instance_id = state.job_instance_id(&job_instance);
        job_instance.set_id(instance_id);

        let mut job_execution = JobExecution::new(job_instance, job_parameters);
        job_execution.set_id(state.next_job_execution_id());
        job_execution.set_pid(std::process::id());

        debug!(
            job_execution_id = job_execution.id(),
            job_instance = job_execution.job_instance().code(),
            "Created job execution"
        );

        if let Some(id) = job_execution.id() {
            state.job_executions.insert(id, job_execution.clone());
        }

        Ok(job_execution)
    }

    async fn update_job_execution(&self, job_execution: &mut JobExecution) -> BatchResult<()> {
        let mut state = self.state.write();

        let id = match job_execution.id() {
            Some(id) => id,
            None => {
                let id = state.next_job_execution_id();
                job_execution.set_id(id);
                id
            }
        };

        for step_execution in job_execution.step_executions_mut() {
            if step_execution.id().is_none() {
                let step_id = state.next_step_execution_id();
                step_execution.set_id(step_id);
            }
        }

        job_execution.set_updated_time(Utc::now());
        state.job_executions.insert(id, job_execution.clone());
        Ok(())
    }

    async fn update_step_execution(&self, step_execution: &mut StepExecution) -> BatchResult<()> {
        let mut state = self.state.write();

        if step_execution.id().is_none() {
            let step_id = state.next_step_execution_id();
            step_execution.set_id(step_id);
        }

        let job_execution_id = step_execution.job_execution_id().ok_or_else(|| {
            BatchError::Repository(format!(
                "Step execution \"{}\" is not attached to a persisted job execution",
                step_execution.step_name()
            ))
        })?;

        let job_execution = state
            .job_executions
            .get_mut(&job_execution_id)
            .ok_or_else(|| {
                BatchError::Repository(format!("Unknown job execution {job_execution_id}"))
            })?;

        job_execution.replace_step_execution(step_execution.clone());
        Ok(())
    }

    async fn get_last_job_execution(
        &self,
        job_instance: &JobInstance,
        status: BatchStatus,
    ) -> BatchResult<Option<JobExecution>> {
        let state = self.state.read();

        let instance_id = job_instance
            .id()
            .or_else(|| state.job_instance_ids.get(job_instance.code()).copied());

        let last = state
            .job_executions
            .values()
            .filter(|execution| execution.status() == status)
            .filter(|execution| match instance_id {
                Some(id) => execution.job_instance().id() == Some(id),
                None => execution.job_instance().code() == job_instance.code(),
            })
            .max_by_key(|execution| (execution.create_time(), execution.id()))
            .cloned();

        Ok(last)
    }

    async fn find_purgeables(&self, days: u32) -> BatchResult<Vec<JobExecution>> {
        // A cutoff before the earliest representable date leaves nothing older than it
        let Some(threshold) = TimeDelta::try_days(i64::from(days))
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            debug!(days, "Purge age reaches past the earliest date, nothing to purge");
            return Ok(Vec::new());
        };

        Ok(self
            .state
            .read()
            .job_executions
            .values()
            .filter(|execution| execution.create_time() < threshold)
            .cloned()
            .collect())
    }

    async fn remove(&self, job_executions: &[JobExecution]) -> BatchResult<()> {
        let mut state = self.state.write();
        for job_execution in job_executions {
            if let Some(id) = job_execution.id() {
                state.job_executions.remove(&id);
            }
        }
        Ok(())
    }
}
