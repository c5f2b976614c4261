//! # Item Contracts
//!
//! The three collaborators of the chunked pipeline. Implementations live in connectors;
//! the pipeline only relies on these signatures:
//!
//! - [`ItemReader::read`] yields `Ok(None)` once the stream is exhausted
//! - [`ItemProcessor::process`] may reject a single item with [`BatchError::InvalidItem`]
//! - [`ItemWriter::write`] receives one non-empty chunk per call
//!
//! Every call is awaited before the next one starts. Each collaborator is handed the
//! running [`StepExecution`] once, before the first read, through `bind_step_execution`,
//! so it can look at job parameters or the working directory. Every call also receives the
//! live execution, so collaborators can record summary information, errors or warnings.
//!
//! [`BatchError::InvalidItem`]: crate::error::BatchError::InvalidItem

mod invalid_item;

pub use invalid_item::InvalidItem;

use crate::error::BatchResult;
use crate::models::StepExecution;
use async_trait::async_trait;

#[async_trait]
pub trait ItemReader: Send {
    type Item: Send;

    /// Next item, or `None` at end of stream
    async fn read(&mut self, step_execution: &mut StepExecution) -> BatchResult<Option<Self::Item>>;

    fn bind_step_execution(&mut self, _step_execution: &StepExecution) {}
}

#[async_trait]
pub trait ItemProcessor: Send {
    type Input: Send;
    type Output: Send;

    async fn process(
        &mut self,
        item: Self::Input,
        step_execution: &mut StepExecution,
    ) -> BatchResult<Self::Output>;

    fn bind_step_execution(&mut self, _step_execution: &StepExecution) {}
}

#[async_trait]
pub trait ItemWriter: Send {
    type Item: Send;

    async fn write(
        &mut self,
        items: Vec<Self::Item>,
        step_execution: &mut StepExecution,
    ) -> BatchResult<()>;

    fn bind_step_execution(&mut self, _step_execution: &StepExecution) {}
}
