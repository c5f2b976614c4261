use super::{Step, StepExecutor, StepWork};
use crate::config::ExecutionConfig;
use crate::constants::defaults;
use crate::error::{BatchError, BatchResult};
use crate::events::{BatchEvent, EventDispatcher};
use crate::item::{InvalidItem, ItemProcessor, ItemReader, ItemWriter};
use crate::models::StepExecution;
use crate::repository::JobRepository;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Chunk-oriented step: read items one by one, process each, write them in chunks of
/// `batch_size`.
///
/// An item rejected by the processor with [`BatchError::InvalidItem`] becomes a warning on
/// the step execution and processing continues. Any other error fails the step. A stop
/// request is honoured between items; the pending chunk is then dropped unwritten.
pub struct ItemStep<R, P, W> {
    executor: StepExecutor,
    reader: Mutex<R>,
    processor: Mutex<P>,
    writer: Mutex<W>,
    batch_size: usize,
}

impl<R, P, W> ItemStep<R, P, W>
where
    R: ItemReader,
    P: ItemProcessor<Input = R::Item>,
    W: ItemWriter<Item = P::Output>,
{
    pub fn new(
        name: impl Into<String>,
        dispatcher: Arc<dyn EventDispatcher>,
        repository: Arc<dyn JobRepository>,
        reader: R,
        processor: P,
        writer: W,
    ) -> Self {
        Self {
            executor: StepExecutor::new(name, dispatcher, repository),
            reader: Mutex::new(reader),
            processor: Mutex::new(processor),
            writer: Mutex::new(writer),
            batch_size: defaults::BATCH_SIZE,
        }
    }

    /// Set the commit interval, at least one item per chunk
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Take the commit interval from configuration
    pub fn with_config(self, config: &ExecutionConfig) -> Self {
        self.with_batch_size(config.batch_size)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn handle_invalid_item(
        &self,
        step_execution: &mut StepExecution,
        reason: String,
        reason_parameters: Map<String, Value>,
        item: InvalidItem,
    ) {
        debug!(reason = %reason, "Skipping invalid item");

        step_execution.add_warning(reason.clone(), reason_parameters.clone(), &item);
        self.executor.dispatcher().dispatch(&BatchEvent::InvalidItem {
            step_execution: &*step_execution,
            reason: &reason,
            reason_parameters: &reason_parameters,
            item: &item,
        });
    }

    async fn flush(
        &self,
        writer: &mut W,
        buffer: &mut Vec<P::Output>,
        step_execution: &mut StepExecution,
    ) -> BatchResult<()> {
        let chunk = std::mem::replace(buffer, Vec::with_capacity(self.batch_size));
        let chunk_len = chunk.len();

        writer.write(chunk, step_execution).await?;
        step_execution.increment_write_count(i64::try_from(chunk_len).unwrap_or(i64::MAX));
        debug!(
            chunk_size = chunk_len,
            write_count = step_execution.write_count(),
            "Chunk written"
        );

        self.executor
            .repository()
            .update_step_execution(step_execution)
            .await
    }
}

#[async_trait]
impl<R, P, W> StepWork for ItemStep<R, P, W>
where
    R: ItemReader,
    P: ItemProcessor<Input = R::Item>,
    W: ItemWriter<Item = P::Output>,
{
    async fn do_execute(&self, step_execution: &mut StepExecution) -> BatchResult<()> {
        let mut reader = self.reader.lock().await;
        let mut processor = self.processor.lock().await;
        let mut writer = self.writer.lock().await;

        reader.bind_step_execution(step_execution);
        processor.bind_step_execution(step_execution);
        writer.bind_step_execution(step_execution);

        let mut buffer = Vec::with_capacity(self.batch_size);

        loop {
            if step_execution.is_terminate_only() {
                debug!(discarded = buffer.len(), "Stop requested, dropping pending chunk");
                return Err(BatchError::interrupted("JobExecution interrupted."));
            }

            let Some(item) = reader.read(step_execution).await? else {
                break;
            };
            step_execution.increment_read_count(1);

            match processor.process(item, step_execution).await {
                Ok(processed) => buffer.push(processed),
                Err(BatchError::InvalidItem {
                    message,
                    parameters,
                    item,
                }) => {
                    self.handle_invalid_item(step_execution, message, parameters, item);
                }
                Err(err) => return Err(err),
            }

            if buffer.len() >= self.batch_size {
                self.flush(&mut *writer, &mut buffer, step_execution).await?;
            }
        }

        if !buffer.is_empty() {
            self.flush(&mut *writer, &mut buffer, step_execution).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl<R, P, W> Step for ItemStep<R, P, W>
where
    R: ItemReader,
    P: ItemProcessor<Input = R::Item>,
    W: ItemWriter<Item = P::Output>,
{
    fn name(&self) -> &str {
        self.executor.name()
    }

    async fn execute(&self, step_execution: &mut StepExecution) -> BatchResult<()> {
        self.executor.execute(self, step_execution).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopDispatcher;
    use crate::repository::InMemoryJobRepository;

    struct Numbers(std::ops::Range<u32>);

    #[async_trait]
    impl ItemReader for Numbers {
        type Item = u32;

        async fn read(&mut self, _step_execution: &mut StepExecution) -> BatchResult<Option<u32>> {
            Ok(self.0.next())
        }
    }

    struct Doubler;

    #[async_trait]
    impl ItemProcessor for Doubler {
        type Input = u32;
        type Output = u32;

        async fn process(
            &mut self,
            item: u32,
            _step_execution: &mut StepExecution,
        ) -> BatchResult<u32> {
            Ok(item * 2)
        }
    }

    struct Discard;

    #[async_trait]
    impl ItemWriter for Discard {
        type Item = u32;

        async fn write(
            &mut self,
            _items: Vec<u32>,
            _step_execution: &mut StepExecution,
        ) -> BatchResult<()> {
            Ok(())
        }
    }

    fn item_step() -> ItemStep<Numbers, Doubler, Discard> {
        ItemStep::new(
            "double",
            Arc::new(NoopDispatcher),
            Arc::new(InMemoryJobRepository::new()),
            Numbers(0..3),
            Doubler,
            Discard,
        )
    }

    #[test]
    fn test_batch_size_is_at_least_one() {
        assert_eq!(item_step().batch_size(), defaults::BATCH_SIZE);
        assert_eq!(item_step().with_batch_size(0).batch_size(), 1);
        assert_eq!(item_step().with_batch_size(25).batch_size(), 25);
    }

    #[test]
    fn test_batch_size_from_config() {
        let config = ExecutionConfig {
            batch_size: 7,
            ..ExecutionConfig::default()
        };
        let step = item_step().with_config(&config);

        assert_eq!(step.batch_size(), 7);
        assert_eq!(step.name(), "double");
    }
}
