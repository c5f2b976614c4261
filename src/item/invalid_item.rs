use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const UNKNOWN: &str = "[unknown]";

/// Snapshot of an item the pipeline could not handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidItem {
    /// Plain structured data
    Data { data: Value },
    /// A domain object, reduced to its class, identity and display form
    Object {
        class: String,
        id: Option<String>,
        display: Option<String>,
    },
    /// A line read from a file
    File { data: Value, line: u64 },
}

impl InvalidItem {
    pub fn data(data: Value) -> Self {
        Self::Data { data }
    }

    pub fn object(
        class: impl Into<String>,
        id: Option<String>,
        display: Option<String>,
    ) -> Self {
        Self::Object {
            class: class.into(),
            id,
            display,
        }
    }

    pub fn file(data: Value, line: u64) -> Self {
        Self::File { data, line }
    }

    /// Plain-data form stored on warnings; objects become `{class, id, string}`
    /// and absent data becomes an empty object
    pub fn invalid_data(&self) -> Value {
        let data = match self {
            Self::Data { data } | Self::File { data, .. } => data.clone(),
            Self::Object { class, id, display } => {
                return json!({
                    "class": class,
                    "id": id.as_deref().unwrap_or(UNKNOWN),
                    "string": display.as_deref().unwrap_or(UNKNOWN),
                })
            }
        };

        if data.is_null() {
            json!({})
        } else {
            data
        }
    }

    /// Line number, for file-based items
    pub fn line_number(&self) -> Option<u64> {
        match self {
            Self::File { line, .. } => Some(*line),
            _ => None,
        }
    }
}
