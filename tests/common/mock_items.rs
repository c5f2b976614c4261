use async_trait::async_trait;
use batch_core::constants::WORKING_DIRECTORY_PARAMETER;
use batch_core::events::{BatchEvent, EventDispatcher};
use batch_core::models::StepExecution;
use batch_core::repository::JobRepository;
use batch_core::{
    BatchError, BatchResult, BatchStatus, InvalidItem, ItemProcessor, ItemReader, ItemStep,
    ItemWriter, StopHandle,
};
use parking_lot::Mutex;
use serde_json::{json, Map};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// Event as seen by the recording dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub name: &'static str,
    pub status: BatchStatus,
    pub step_name: Option<String>,
}

/// Dispatcher keeping every event in dispatch order
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|event| event.name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.name == name)
            .count()
    }
}

impl EventDispatcher for RecordingDispatcher {
    fn dispatch(&self, event: &BatchEvent<'_>) {
        let (status, step_name) = match (event.job_execution(), event.step_execution()) {
            (Some(job_execution), _) => (job_execution.status(), None),
            (_, Some(step_execution)) => (
                step_execution.status(),
                Some(step_execution.step_name().to_string()),
            ),
            _ => (BatchStatus::Unknown, None),
        };

        self.events.lock().push(RecordedEvent {
            name: event.name(),
            status,
            step_name,
        });
    }
}

/// What the scripted collaborators observed, shared with the test body
#[derive(Debug, Clone, Default)]
pub struct ItemLog {
    inner: Arc<Mutex<ItemLogState>>,
}

#[derive(Debug, Default)]
struct ItemLogState {
    read_calls: usize,
    processed: Vec<u32>,
    chunks: Vec<Vec<u32>>,
    working_directory: Option<String>,
    bound_collaborators: usize,
}

impl ItemLog {
    pub fn read_calls(&self) -> usize {
        self.inner.lock().read_calls
    }

    pub fn processed(&self) -> Vec<u32> {
        self.inner.lock().processed.clone()
    }

    pub fn chunks(&self) -> Vec<Vec<u32>> {
        self.inner.lock().chunks.clone()
    }

    pub fn working_directory(&self) -> Option<String> {
        self.inner.lock().working_directory.clone()
    }

    pub fn bound_collaborators(&self) -> usize {
        self.inner.lock().bound_collaborators
    }

    fn bind(&self, step_execution: &StepExecution) {
        let mut state = self.inner.lock();
        state.bound_collaborators += 1;
        state.working_directory = step_execution
            .execution_context()
            .get_str(WORKING_DIRECTORY_PARAMETER)
            .map(str::to_string);
    }
}

/// Reader yielding a fixed list of numbers
pub struct ScriptedReader {
    items: VecDeque<u32>,
    log: ItemLog,
    fail_on_read: Option<usize>,
    stop_after: Option<(usize, StopHandle)>,
    delivered: usize,
}

impl ScriptedReader {
    pub fn new(items: impl IntoIterator<Item = u32>, log: &ItemLog) -> Self {
        Self {
            items: items.into_iter().collect(),
            log: log.clone(),
            fail_on_read: None,
            stop_after: None,
            delivered: 0,
        }
    }

    /// Fail the n-th read call (1-based)
    pub fn failing_on_read(mut self, read_call: usize) -> Self {
        self.fail_on_read = Some(read_call);
        self
    }

    /// Request a stop right after delivering `items` items
    pub fn stopping_after(mut self, items: usize, stop_handle: StopHandle) -> Self {
        self.stop_after = Some((items, stop_handle));
        self
    }
}

#[async_trait]
impl ItemReader for ScriptedReader {
    type Item = u32;

    async fn read(&mut self, step_execution: &mut StepExecution) -> BatchResult<Option<u32>> {
        let read_call = {
            let mut state = self.log.inner.lock();
            state.read_calls += 1;
            state.read_calls
        };

        if self.fail_on_read == Some(read_call) {
            return Err(BatchError::failure("reader exploded"));
        }

        let item = self.items.pop_front();
        if item.is_some() {
            self.delivered += 1;
            step_execution.increment_summary_info("read", 1);
            if let Some((after, stop_handle)) = &self.stop_after {
                if self.delivered == *after {
                    stop_handle.stop();
                }
            }
        }

        Ok(item)
    }

    fn bind_step_execution(&mut self, step_execution: &StepExecution) {
        self.log.bind(step_execution);
    }
}

/// Processor multiplying by ten, rejecting or failing on chosen items
pub struct ScriptedProcessor {
    log: ItemLog,
    invalid: HashSet<u32>,
    fail_on: Option<u32>,
}

impl ScriptedProcessor {
    pub fn new(log: &ItemLog) -> Self {
        Self {
            log: log.clone(),
            invalid: HashSet::new(),
            fail_on: None,
        }
    }

    pub fn rejecting(mut self, items: impl IntoIterator<Item = u32>) -> Self {
        self.invalid.extend(items);
        self
    }

    pub fn failing_on(mut self, item: u32) -> Self {
        self.fail_on = Some(item);
        self
    }
}

#[async_trait]
impl ItemProcessor for ScriptedProcessor {
    type Input = u32;
    type Output = u32;

    async fn process(
        &mut self,
        item: u32,
        _step_execution: &mut StepExecution,
    ) -> BatchResult<u32> {
        self.log.inner.lock().processed.push(item);

        if self.invalid.contains(&item) {
            let mut parameters = Map::new();
            parameters.insert("{{ item }}".to_string(), json!(item));
            return Err(BatchError::invalid_item_with_parameters(
                format!("Item {item} is invalid"),
                parameters,
                InvalidItem::data(json!({ "value": item })),
            ));
        }

        if self.fail_on == Some(item) {
            return Err(BatchError::failure(format!("processor exploded on {item}")));
        }

        Ok(item * 10)
    }

    fn bind_step_execution(&mut self, step_execution: &StepExecution) {
        self.log.bind(step_execution);
    }
}

/// Writer recording every chunk it receives
pub struct RecordingWriter {
    log: ItemLog,
    fail_on_chunk: Option<usize>,
}

impl RecordingWriter {
    pub fn new(log: &ItemLog) -> Self {
        Self {
            log: log.clone(),
            fail_on_chunk: None,
        }
    }

    /// Fail the n-th write call (1-based)
    pub fn failing_on_chunk(mut self, chunk: usize) -> Self {
        self.fail_on_chunk = Some(chunk);
        self
    }
}

#[async_trait]
impl ItemWriter for RecordingWriter {
    type Item = u32;

    async fn write(
        &mut self,
        items: Vec<u32>,
        step_execution: &mut StepExecution,
    ) -> BatchResult<()> {
        let mut state = self.log.inner.lock();
        if self.fail_on_chunk == Some(state.chunks.len() + 1) {
            return Err(BatchError::failure("writer exploded"));
        }
        step_execution.increment_summary_info("write", items.len() as i64);
        state.chunks.push(items);
        Ok(())
    }

    fn bind_step_execution(&mut self, step_execution: &StepExecution) {
        self.log.bind(step_execution);
    }
}

pub type ScriptedItemStep = ItemStep<ScriptedReader, ScriptedProcessor, RecordingWriter>;

/// Item step over the scripted collaborators
pub fn scripted_item_step(
    name: &str,
    dispatcher: Arc<dyn EventDispatcher>,
    repository: Arc<dyn JobRepository>,
    reader: ScriptedReader,
    processor: ScriptedProcessor,
    writer: RecordingWriter,
    batch_size: usize,
) -> ScriptedItemStep {
    ItemStep::new(name, dispatcher, repository, reader, processor, writer)
        .with_batch_size(batch_size)
}
