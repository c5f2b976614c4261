//! # Jobs
//!
//! The [`Job`] orchestrator, its scoped [`WorkingDirectory`], and parameter defaulting.

#[allow(clippy::module_inception)]
mod job;
mod parameters;
mod working_directory;

pub use job::Job;
pub use parameters::{DefaultValuesProvider, DefaultValuesProviderRegistry, JobParametersFactory};
pub use working_directory::WorkingDirectory;
