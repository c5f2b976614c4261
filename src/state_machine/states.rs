use crate::error::BatchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a job or step execution.
///
/// Variants are declared in ascending severity, so the derived ordering is the
/// upgrade order: a status only ever moves to an equal or more severe one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    /// Execution finished successfully
    Completed,
    /// Execution created, not yet running
    Starting,
    /// Execution is running
    Started,
    /// Stop requested, not yet honoured
    Stopping,
    /// Execution stopped before completion
    Stopped,
    /// Execution failed
    Failed,
    /// Execution abandoned, will not be restarted
    Abandoned,
    /// Status could not be determined
    Unknown,
}

impl BatchStatus {
    pub const ALL: [BatchStatus; 8] = [
        Self::Completed,
        Self::Starting,
        Self::Started,
        Self::Stopping,
        Self::Stopped,
        Self::Failed,
        Self::Abandoned,
        Self::Unknown,
    ];

    /// Numeric code of the status (COMPLETED = 1 .. UNKNOWN = 8)
    pub fn value(&self) -> u8 {
        match self {
            Self::Completed => 1,
            Self::Starting => 2,
            Self::Started => 3,
            Self::Stopping => 4,
            Self::Stopped => 5,
            Self::Failed => 6,
            Self::Abandoned => 7,
            Self::Unknown => 8,
        }
    }

    /// The more severe of the two statuses
    pub fn max(a: BatchStatus, b: BatchStatus) -> BatchStatus {
        std::cmp::max(a, b)
    }

    /// Combine the current status with `candidate`.
    ///
    /// Past STARTED the more severe status wins. While both are at most STARTED, COMPLETED wins
    /// so a running execution can finish.
    pub fn upgrade_to(self, candidate: BatchStatus) -> BatchStatus {
        if self > Self::Started || candidate > Self::Started {
            return Self::max(self, candidate);
        }

        if self == Self::Completed || candidate == Self::Completed {
            Self::Completed
        } else {
            Self::max(self, candidate)
        }
    }

    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed | Self::Abandoned)
    }

    /// Check if this is an active state
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Starting | Self::Started | Self::Stopping)
    }

    /// Check if this status marks an unsuccessful outcome
    pub fn is_unsuccessful(&self) -> bool {
        *self >= Self::Failed
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Starting => "STARTING",
            Self::Started => "STARTED",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::Failed => "FAILED",
            Self::Abandoned => "ABANDONED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| BatchError::InvalidStatus(s.to_string()))
    }
}

impl TryFrom<u8> for BatchStatus {
    type Error = BatchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .find(|status| status.value() == value)
            .copied()
            .ok_or_else(|| BatchError::InvalidStatus(value.to_string()))
    }
}

/// Default status for new executions
impl Default for BatchStatus {
    fn default() -> Self {
        Self::Starting
    }
}
