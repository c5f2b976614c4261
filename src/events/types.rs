use crate::constants::events;
use crate::item::InvalidItem;
use crate::models::{JobExecution, StepExecution};
use serde_json::{json, Map, Value};

/// Lifecycle event, borrowing the execution it is about
#[derive(Debug, Clone, Copy)]
pub enum BatchEvent<'a> {
    BeforeJobExecution(&'a JobExecution),
    AfterJobExecution(&'a JobExecution),
    JobExecutionStopped(&'a JobExecution),
    JobExecutionInterrupted(&'a JobExecution),
    JobExecutionFatalError(&'a JobExecution),
    BeforeJobStatusUpgrade(&'a JobExecution),
    BeforeStepExecution(&'a StepExecution),
    AfterStepExecution(&'a StepExecution),
    StepExecutionSuccess(&'a StepExecution),
    StepExecutionInterrupted(&'a StepExecution),
    StepExecutionErrored(&'a StepExecution),
    InvalidItem {
        step_execution: &'a StepExecution,
        reason: &'a str,
        reason_parameters: &'a Map<String, Value>,
        item: &'a InvalidItem,
    },
}

impl<'a> BatchEvent<'a> {
    /// Stable event name, see [`crate::constants::events`]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeforeJobExecution(_) => events::BEFORE_JOB_EXECUTION,
            Self::AfterJobExecution(_) => events::AFTER_JOB_EXECUTION,
            Self::JobExecutionStopped(_) => events::JOB_EXECUTION_STOPPED,
            Self::JobExecutionInterrupted(_) => events::JOB_EXECUTION_INTERRUPTED,
            Self::JobExecutionFatalError(_) => events::JOB_EXECUTION_FATAL_ERROR,
            Self::BeforeJobStatusUpgrade(_) => events::BEFORE_JOB_STATUS_UPGRADE,
            Self::BeforeStepExecution(_) => events::BEFORE_STEP_EXECUTION,
            Self::AfterStepExecution(_) => events::AFTER_STEP_EXECUTION,
            Self::StepExecutionSuccess(_) => events::STEP_EXECUTION_SUCCEEDED,
            Self::StepExecutionInterrupted(_) => events::STEP_EXECUTION_INTERRUPTED,
            Self::StepExecutionErrored(_) => events::STEP_EXECUTION_ERRORED,
            Self::InvalidItem { .. } => events::INVALID_ITEM,
        }
    }

    /// The job execution carried by job-level events
    pub fn job_execution(&self) -> Option<&'a JobExecution> {
        match *self {
            Self::BeforeJobExecution(execution)
            | Self::AfterJobExecution(execution)
            | Self::JobExecutionStopped(execution)
            | Self::JobExecutionInterrupted(execution)
            | Self::JobExecutionFatalError(execution)
            | Self::BeforeJobStatusUpgrade(execution) => Some(execution),
            _ => None,
        }
    }

    /// The step execution carried by step-level and item events
    pub fn step_execution(&self) -> Option<&'a StepExecution> {
        match *self {
            Self::BeforeStepExecution(execution)
            | Self::AfterStepExecution(execution)
            | Self::StepExecutionSuccess(execution)
            | Self::StepExecutionInterrupted(execution)
            | Self::StepExecutionErrored(execution) => Some(execution),
            Self::InvalidItem { step_execution, .. } => Some(step_execution),
            _ => None,
        }
    }

    /// JSON snapshot of the event payload
    pub fn context(&self) -> Result<Value, serde_json::Error> {
        if let Self::InvalidItem {
            step_execution,
            reason,
            reason_parameters,
            item,
        } = *self
        {
            return Ok(json!({
                "step_execution": serde_json::to_value(step_execution)?,
                "reason": reason,
                "reason_parameters": reason_parameters,
                "item": item.invalid_data(),
            }));
        }

        match (self.job_execution(), self.step_execution()) {
            (Some(job_execution), _) => Ok(json!({ "job_execution": serde_json::to_value(job_execution)? })),
            (_, Some(step_execution)) => Ok(json!({ "step_execution": serde_json::to_value(step_execution)? })),
            _ => Ok(Value::Null),
        }
    }
}
