//! Structured normalization of job instances for export.

use crate::models::JobInstance;
use serde_json::{json, Value};

/// Formats a [`JobInstanceNormalizer`] can produce
pub const SUPPORTED_FORMATS: [&str; 2] = ["json", "xml"];

/// Turns a [`JobInstance`] into `{code, label, connector, type, configuration}`
#[derive(Debug, Clone, Copy, Default)]
pub struct JobInstanceNormalizer;

impl JobInstanceNormalizer {
    pub fn normalize(&self, job_instance: &JobInstance) -> Value {
        json!({
            "code": job_instance.code(),
            "label": job_instance.label(),
            "connector": job_instance.connector(),
            "type": job_instance.job_type(),
            "configuration": job_instance.raw_parameters(),
        })
    }

    pub fn supports_normalization(&self, format: Option<&str>) -> bool {
        format.is_some_and(|format| SUPPORTED_FORMATS.contains(&format))
    }
}
