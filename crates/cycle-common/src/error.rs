use crate::time::{CycleIndex, Timestamp};
use thiserror::Error;

/// Cycle clock errors covering invalid input, usage errors, and checkpoint failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// A cycle length of zero was supplied.
    #[error("invalid cycle length: {length} (must be positive)")]
    InvalidLength {
        /// Rejected length.
        length: u64,
    },

    /// A query or request was made for a time before the clock was initialized.
    #[error("query at {now} precedes clock initialization at {init_time}")]
    QueryBeforeInit {
        /// Query time.
        now: Timestamp,
        /// Initialization time of the clock.
        init_time: Timestamp,
    },

    /// Index or timestamp arithmetic exceeded the representable range.
    #[error("arithmetic overflow while computing {operation}")]
    Overflow {
        /// Computation that overflowed.
        operation: &'static str,
    },

    /// A length change was requested at a time earlier than an already recorded change.
    #[error("length change at {now} precedes recorded history starting at {earliest}")]
    NonMonotonicTime {
        /// Request time.
        now: Timestamp,
        /// Earliest time a new request may carry.
        earliest: Timestamp,
    },

    /// Explicit advance attempted before the acknowledged cycle ended.
    #[error("cycle {current} has not ended (ends at {ends_at})")]
    CycleNotEnded {
        /// Cycle still running.
        current: CycleIndex,
        /// End of that cycle.
        ends_at: Timestamp,
    },

    /// The authorization layer denied a length change.
    #[error("actor '{actor}' is not authorized to change the cycle length")]
    Unauthorized {
        /// Denied actor.
        actor: String,
    },

    /// A restored checkpoint violates a clock invariant.
    #[error("invalid checkpoint: {0}")]
    InvalidCheckpoint(String),

    /// Checkpoint could not be read, written, or decoded.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),
}

/// Convenience type alias for clock operations.
pub type ClockResult<T> = Result<T, ClockError>;

/// Shorthand for an [`ClockError::Overflow`] on `operation`.
#[must_use]
pub fn overflow(operation: &'static str) -> ClockError {
    ClockError::Overflow { operation }
}
