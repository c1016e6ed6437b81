use std::time::Duration;

use thiserror::Error;

/// Errors produced by tree alignment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlignError {
    /// The alignment did not finish within its wall-clock budget.
    #[error("tree alignment timed out after {elapsed:?}")]
    TimedOut { elapsed: Duration },
}

/// Convenience alias for alignment results.
pub type AlignResult<T> = Result<T, AlignError>;
