use super::types::BatchEvent;

/// Synchronous event sink injected into jobs and steps.
///
/// Dispatch is fire-and-forget: the orchestration never depends on what a listener does.
pub trait EventDispatcher: Send + Sync {
    fn dispatch(&self, event: &BatchEvent<'_>);
}

/// Dispatcher that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDispatcher;

impl EventDispatcher for NoopDispatcher {
    fn dispatch(&self, _event: &BatchEvent<'_>) {}
}
