use crate::error::BatchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exit code of an execution.
///
/// Unlike [`BatchStatus`](super::BatchStatus) the vocabulary is open: listeners may
/// attach custom codes, which rank between NOOP and FAILED.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ExitCode {
    Executing,
    Completed,
    Noop,
    Failed,
    Stopped,
    Unknown,
    Custom(String),
}

impl ExitCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Executing => "EXECUTING",
            Self::Completed => "COMPLETED",
            Self::Noop => "NOOP",
            Self::Failed => "FAILED",
            Self::Stopped => "STOPPED",
            Self::Unknown => "UNKNOWN",
            Self::Custom(code) => code,
        }
    }

    /// Rank used when merging exit statuses; UNKNOWN absorbs everything
    pub fn severity(&self) -> u8 {
        match self {
            Self::Executing => 1,
            Self::Completed => 2,
            Self::Noop => 3,
            Self::Custom(_) => 4,
            Self::Failed | Self::Stopped => 5,
            Self::Unknown => 6,
        }
    }

    /// Parse a code, rejecting blank custom codes
    pub fn parse(code: &str) -> Result<Self, BatchError> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(BatchError::InvalidExitCode(code.to_string()));
        }
        Ok(Self::from(trimmed.to_string()))
    }
}

impl From<String> for ExitCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "EXECUTING" => Self::Executing,
            "COMPLETED" => Self::Completed,
            "NOOP" => Self::Noop,
            "FAILED" => Self::Failed,
            "STOPPED" => Self::Stopped,
            "UNKNOWN" => Self::Unknown,
            _ => Self::Custom(code),
        }
    }
}

impl From<ExitCode> for String {
    fn from(code: ExitCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of an execution: a code plus an ordered, duplicate-free list of
/// description fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    code: ExitCode,
    descriptions: Vec<String>,
}

impl ExitStatus {
    pub fn new(code: ExitCode) -> Self {
        Self {
            code,
            descriptions: Vec::new(),
        }
    }

    pub fn with_description(code: ExitCode, description: impl Into<String>) -> Self {
        let mut status = Self::new(code);
        status.add_exit_description(description);
        status
    }

    pub fn executing() -> Self {
        Self::new(ExitCode::Executing)
    }

    pub fn completed() -> Self {
        Self::new(ExitCode::Completed)
    }

    pub fn noop() -> Self {
        Self::new(ExitCode::Noop)
    }

    pub fn failed() -> Self {
        Self::new(ExitCode::Failed)
    }

    pub fn stopped() -> Self {
        Self::new(ExitCode::Stopped)
    }

    pub fn unknown() -> Self {
        Self::new(ExitCode::Unknown)
    }

    pub fn exit_code(&self) -> &ExitCode {
        &self.code
    }

    /// Description fragments joined with `"; "`
    pub fn exit_description(&self) -> String {
        self.descriptions.join("; ")
    }

    pub fn descriptions(&self) -> &[String] {
        &self.descriptions
    }

    /// Append a description fragment, ignoring blanks and exact duplicates
    pub fn add_exit_description(&mut self, description: impl Into<String>) -> &mut Self {
        let description = description.into();
        if !description.trim().is_empty() && !self.descriptions.contains(&description) {
            self.descriptions.push(description);
        }
        self
    }

    /// Append the type name and message of an error
    pub fn add_exit_description_from_error(&mut self, error: &BatchError) -> &mut Self {
        self.add_exit_description(format!("{}: {}", error.type_name(), error))
    }

    /// Combine two statuses.
    ///
    /// The code of greater severity wins, the left operand on ties, so EXECUTING always
    /// yields to the other operand and equal codes are kept. Descriptions of both operands
    /// are concatenated in operand order without duplicates.
    pub fn logical_and(&self, other: &ExitStatus) -> ExitStatus {
        let code = if other.code.severity() > self.code.severity() {
            other.code.clone()
        } else {
            self.code.clone()
        };

        let mut combined = ExitStatus::new(code);
        for description in self.descriptions.iter().chain(other.descriptions.iter()) {
            combined.add_exit_description(description.clone());
        }
        combined
    }

    /// Check if the execution is still running
    pub fn is_running(&self) -> bool {
        matches!(self.code, ExitCode::Executing | ExitCode::Unknown)
    }
}

impl Default for ExitStatus {
    fn default() -> Self {
        Self::executing()
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "exitCode={};exitDescription={}",
            self.code,
            self.exit_description()
        )
    }
}
