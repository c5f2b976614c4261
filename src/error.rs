//! # Structured Error Handling
//!
//! A single error enum covers every condition the orchestration layer reacts to. Two categories
//! are recovered rather than propagated: [`BatchError::Interrupted`] turns into a STOPPED
//! transition at the step and job boundaries, and [`BatchError::InvalidItem`] turns into a
//! [`Warning`](crate::models::Warning) inside the item pipeline. Everything else is a failure.

use crate::config::ConfigurationError;
use crate::item::InvalidItem;
use crate::state_machine::BatchStatus;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Cooperative stop request, carrying the status to upgrade to
    #[error("{message}")]
    Interrupted { message: String, status: BatchStatus },

    /// A single item could not be processed
    #[error("{message}")]
    InvalidItem {
        message: String,
        parameters: Map<String, Value>,
        item: InvalidItem,
    },

    /// Runtime failure with translatable message parameters
    #[error("{message}")]
    Runtime {
        message: String,
        parameters: HashMap<String, String>,
        code: i32,
        #[source]
        source: Option<Box<BatchError>>,
    },

    #[error("Invalid batch status: {0}")]
    InvalidStatus(String),

    #[error("Invalid exit code: {0}")]
    InvalidExitCode(String),

    #[error("{0}")]
    Logic(String),

    #[error("{0}")]
    NonExistingService(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Failure(#[from] anyhow::Error),
}

pub type BatchResult<T> = std::result::Result<T, BatchError>;

impl BatchError {
    /// Interruption carrying the default STOPPED status
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::Interrupted {
            message: message.into(),
            status: BatchStatus::Stopped,
        }
    }

    /// Interruption carrying an explicit status
    pub fn interrupted_with_status(message: impl Into<String>, status: BatchStatus) -> Self {
        Self::Interrupted {
            message: message.into(),
            status,
        }
    }

    pub fn invalid_item(message: impl Into<String>, item: InvalidItem) -> Self {
        Self::invalid_item_with_parameters(message, Map::new(), item)
    }

    /// Invalid item whose reason carries translatable parameters
    pub fn invalid_item_with_parameters(
        message: impl Into<String>,
        parameters: Map<String, Value>,
        item: InvalidItem,
    ) -> Self {
        Self::InvalidItem {
            message: message.into(),
            parameters,
            item,
        }
    }

    pub fn runtime(message: impl Into<String>, parameters: HashMap<String, String>) -> Self {
        Self::Runtime {
            message: message.into(),
            parameters,
            code: 0,
            source: None,
        }
    }

    /// Wrap a lower level error into a runtime failure
    pub fn runtime_caused_by(message: impl Into<String>, code: i32, cause: BatchError) -> Self {
        Self::Runtime {
            message: message.into(),
            parameters: HashMap::new(),
            code,
            source: Some(Box::new(cause)),
        }
    }

    /// Arbitrary collaborator failure
    pub fn failure(message: impl std::fmt::Display) -> Self {
        Self::Failure(anyhow::anyhow!("{message}"))
    }

    /// True when this error, or any error it was caused by, is an interruption
    pub fn is_interruption(&self) -> bool {
        match self {
            Self::Interrupted { .. } => return true,
            Self::Failure(inner) => {
                if let Some(batch_error) = inner.downcast_ref::<BatchError>() {
                    return batch_error.is_interruption();
                }
            }
            _ => {}
        }

        let mut current = std::error::Error::source(self);
        while let Some(err) = current {
            let batch_error = err
                .downcast_ref::<BatchError>()
                .or_else(|| err.downcast_ref::<Box<BatchError>>().map(|boxed| &**boxed));
            if let Some(BatchError::Interrupted { .. }) = batch_error {
                return true;
            }
            current = err.source();
        }

        false
    }

    /// Status an interruption asks to be upgraded to, if this is one
    pub fn interruption_status(&self) -> Option<BatchStatus> {
        match self {
            Self::Interrupted { status, .. } => Some(*status),
            Self::Runtime {
                source: Some(cause),
                ..
            } => cause.interruption_status(),
            _ => None,
        }
    }

    /// Stable qualified name of the error kind, used in exit descriptions and failure records
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Interrupted { .. } => "batch_core::JobInterrupted",
            Self::InvalidItem { .. } => "batch_core::InvalidItem",
            Self::Runtime { .. } => "batch_core::RuntimeError",
            Self::InvalidStatus(_) => "batch_core::InvalidStatus",
            Self::InvalidExitCode(_) => "batch_core::InvalidExitCode",
            Self::Logic(_) => "batch_core::LogicError",
            Self::NonExistingService(_) => "batch_core::NonExistingService",
            Self::Repository(_) => "batch_core::RepositoryError",
            Self::Configuration(_) => "batch_core::ConfigurationError",
            Self::Serialization(_) => "batch_core::SerializationError",
            Self::Io(_) => "batch_core::IoError",
            Self::Failure(_) => "batch_core::Failure",
        }
    }

    /// Message parameters, only carried by runtime failures
    pub fn message_parameters(&self) -> HashMap<String, String> {
        match self {
            Self::Runtime { parameters, .. } => parameters.clone(),
            _ => HashMap::new(),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::Runtime { code, .. } => *code,
            Self::Io(err) => err.raw_os_error().unwrap_or(0),
            _ => 0,
        }
    }

    /// Render the error and its cause chain, one error per line
    pub fn trace(&self) -> String {
        let mut lines = vec![format!("#0 {}: {}", self.type_name(), self)];
        let mut current = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = current {
            lines.push(format!("#{depth} {err}"));
            depth += 1;
            current = err.source();
        }
        lines.join("\n")
    }
}
