use super::Job;
use crate::error::{BatchError, BatchResult};
use crate::models::JobParameters;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Supplies default parameter values for the jobs it supports
pub trait DefaultValuesProvider: Send + Sync {
    fn supports(&self, job: &Job) -> bool;

    fn default_values(&self) -> Map<String, Value>;
}

/// Ordered set of providers; the first one supporting a job wins
#[derive(Default)]
pub struct DefaultValuesProviderRegistry {
    providers: Vec<Arc<dyn DefaultValuesProvider>>,
}

impl DefaultValuesProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn DefaultValuesProvider>) -> &mut Self {
        self.providers.push(provider);
        self
    }

    pub fn get(&self, job: &Job) -> BatchResult<Arc<dyn DefaultValuesProvider>> {
        self.providers
            .iter()
            .find(|provider| provider.supports(job))
            .cloned()
            .ok_or_else(|| {
                BatchError::NonExistingService(format!(
                    "No default values provider has been defined for the Job \"{}\"",
                    job.name()
                ))
            })
    }
}

/// Builds job parameters from defaults plus explicitly given values
pub struct JobParametersFactory {
    registry: Arc<DefaultValuesProviderRegistry>,
}

impl JobParametersFactory {
    pub fn new(registry: Arc<DefaultValuesProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Given values override defaults with the same key
    pub fn create(&self, job: &Job, parameters: Map<String, Value>) -> BatchResult<JobParameters> {
        let mut merged = self.registry.get(job)?.default_values();
        merged.extend(parameters);
        Ok(JobParameters::new(merged))
    }
}
