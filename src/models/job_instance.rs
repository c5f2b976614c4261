use crate::error::{BatchError, BatchResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Job instance types
pub const TYPE_IMPORT: &str = "import";
pub const TYPE_EXPORT: &str = "export";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobInstanceStatus {
    #[default]
    Ready,
    Draft,
    InProgress,
}

/// Stored, reusable configuration of a job: which connector job to run and with
/// which raw parameters. It can be executed any number of times.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobInstance {
    id: Option<i64>,
    code: String,
    label: String,
    job_name: Option<String>,
    connector: Option<String>,
    #[serde(rename = "type")]
    job_type: Option<String>,
    status: JobInstanceStatus,
    raw_parameters: Map<String, Value>,
}

impl JobInstance {
    pub fn new(
        connector: Option<String>,
        job_type: Option<String>,
        job_name: Option<String>,
    ) -> Self {
        Self {
            connector,
            job_type,
            job_name,
            ..Self::default()
        }
    }

    /// Copy with identity reset
    pub fn restart_copy(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn set_id(&mut self, id: i64) -> &mut Self {
        self.id = Some(id);
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn set_code(&mut self, code: impl Into<String>) -> &mut Self {
        self.code = code.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = label.into();
        self
    }

    pub fn job_name(&self) -> Option<&str> {
        self.job_name.as_deref()
    }

    /// The job name can only be assigned once
    pub fn set_job_name(&mut self, job_name: impl Into<String>) -> BatchResult<&mut Self> {
        if self.job_name.is_some() {
            return Err(BatchError::Logic(
                "Job name already set in JobInstance".to_string(),
            ));
        }
        self.job_name = Some(job_name.into());
        Ok(self)
    }

    pub fn connector(&self) -> Option<&str> {
        self.connector.as_deref()
    }

    /// The connector can only be assigned once
    pub fn set_connector(&mut self, connector: impl Into<String>) -> BatchResult<&mut Self> {
        if self.connector.is_some() {
            return Err(BatchError::Logic(
                "Connector already set in JobInstance".to_string(),
            ));
        }
        self.connector = Some(connector.into());
        Ok(self)
    }

    pub fn job_type(&self) -> Option<&str> {
        self.job_type.as_deref()
    }

    pub fn set_job_type(&mut self, job_type: impl Into<String>) -> &mut Self {
        self.job_type = Some(job_type.into());
        self
    }

    pub fn status(&self) -> JobInstanceStatus {
        self.status
    }

    pub fn set_status(&mut self, status: JobInstanceStatus) -> &mut Self {
        self.status = status;
        self
    }

    pub fn raw_parameters(&self) -> &Map<String, Value> {
        &self.raw_parameters
    }

    pub fn set_raw_parameters(&mut self, raw_parameters: Map<String, Value>) -> &mut Self {
        self.raw_parameters = raw_parameters;
        self
    }
}
