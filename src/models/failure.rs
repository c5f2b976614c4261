use crate::error::BatchError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Serializable record of an error captured on an execution.
///
/// The raw error is not kept so the record survives persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureException {
    pub class: String,
    pub message: String,
    #[serde(rename = "messageParameters")]
    pub message_parameters: HashMap<String, String>,
    pub code: i32,
    pub trace: String,
}

impl From<&BatchError> for FailureException {
    fn from(error: &BatchError) -> Self {
        Self {
            class: error.type_name().to_string(),
            message: error.to_string(),
            message_parameters: error.message_parameters(),
            code: error.code(),
            trace: error.trace(),
        }
    }
}
