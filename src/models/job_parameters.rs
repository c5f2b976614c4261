use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Resolved, immutable parameters of one job execution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobParameters {
    parameters: Map<String, Value>,
}

impl JobParameters {
    pub fn new(parameters: Map<String, Value>) -> Self {
        Self { parameters }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.parameters.contains_key(key)
    }

    pub fn all(&self) -> &Map<String, Value> {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl From<Map<String, Value>> for JobParameters {
    fn from(parameters: Map<String, Value>) -> Self {
        Self::new(parameters)
    }
}
