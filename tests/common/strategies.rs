use batch_core::{BatchStatus, ExitCode, ExitStatus};
use proptest::prelude::*;

/// Strategy for any batch status
pub fn batch_status_strategy() -> impl Strategy<Value = BatchStatus> {
    prop::sample::select(BatchStatus::ALL.to_vec())
}

/// Strategy for exit codes, including connector-defined custom codes
pub fn exit_code_strategy() -> impl Strategy<Value = ExitCode> {
    prop_oneof![
        Just(ExitCode::Executing),
        Just(ExitCode::Completed),
        Just(ExitCode::Noop),
        Just(ExitCode::Failed),
        Just(ExitCode::Stopped),
        Just(ExitCode::Unknown),
        "X_[A-Z]{2,8}".prop_map(ExitCode::Custom),
    ]
}

/// Strategy for exit statuses with a handful of (possibly repeated) descriptions
pub fn exit_status_strategy() -> impl Strategy<Value = ExitStatus> {
    (
        exit_code_strategy(),
        prop::collection::vec(prop::sample::select(vec!["read error", "write error", "timeout", "skipped"]), 0..4),
    )
        .prop_map(|(code, descriptions)| {
            let mut exit_status = ExitStatus::new(code);
            for description in descriptions {
                exit_status.add_exit_description(description);
            }
            exit_status
        })
}

/// Counter increments as (is_read, step) pairs, including non-positive steps
pub fn counter_increments_strategy() -> impl Strategy<Value = Vec<(bool, i64)>> {
    prop::collection::vec((any::<bool>(), -5i64..50), 0..40)
}
