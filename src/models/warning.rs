use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Non-fatal problem recorded against a single item during a step.
///
/// Created through [`StepExecution::add_warning`](super::StepExecution::add_warning), which
/// stores the item as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    step_execution_id: Option<i64>,
    step_name: String,
    reason: String,
    reason_parameters: Map<String, Value>,
    item: Value,
}

impl Warning {
    pub(crate) fn new(
        step_execution_id: Option<i64>,
        step_name: impl Into<String>,
        reason: impl Into<String>,
        reason_parameters: Map<String, Value>,
        item: Value,
    ) -> Self {
        Self {
            step_execution_id,
            step_name: step_name.into(),
            reason: reason.into(),
            reason_parameters,
            item,
        }
    }

    pub fn step_execution_id(&self) -> Option<i64> {
        self.step_execution_id
    }

    pub fn step_name(&self) -> &str {
        &self.step_name
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn reason_parameters(&self) -> &Map<String, Value> {
        &self.reason_parameters
    }

    pub fn item(&self) -> &Value {
        &self.item
    }

    pub fn to_value(&self) -> Value {
        json!({
            "reason": self.reason,
            "reasonParameters": self.reason_parameters,
            "item": self.item,
        })
    }
}
