pub mod dispatcher;
pub mod publisher;
pub mod types;

// Re-export key types for convenience
pub use dispatcher::{EventDispatcher, NoopDispatcher};
pub use publisher::{EventPublisher, PublishedEvent};
pub use types::BatchEvent;
