// Status algebra for job and step executions
//
// BatchStatus is a closed, totally ordered lifecycle state that only moves upward;
// ExitStatus is the terminal outcome code plus description fragments, merged with logical_and.

pub mod exit_status;
pub mod states;

pub use exit_status::{ExitCode, ExitStatus};
pub use states::BatchStatus;
