use thiserror::Error;

/// Errors raised by the scheduling engine
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleError {
    /// Out-of-range or inconsistent parameters, detected at construction
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A hook was called out of order or on a policy that does not support it
    #[error("sequence violation: {0}")]
    SequenceViolation(String),
}

pub type Result<T, E = ScheduleError> = std::result::Result<T, E>;

/// Shorthand for building an `InvalidConfiguration` error
pub(crate) fn invalid(message: impl Into<String>) -> ScheduleError {
    ScheduleError::InvalidConfiguration(message.into())
}
