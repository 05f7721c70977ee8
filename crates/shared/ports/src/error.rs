use thiserror::Error;

/// Domain-level errors for virtual-clock operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClockError {
    #[error("the time is not currently frozen")]
    UnfrozenTime,

    #[error("cannot resolve moment: {0}")]
    InvalidMoment(String),

    #[error("cannot resolve duration: {0}")]
    InvalidDuration(String),

    #[error("speed must be a finite number, got {0}")]
    InvalidSpeed(f64),

    #[error("synchronizer rejected the clock update: {0}")]
    Synchronizer(String),
}

pub type ClockResult<T> = std::result::Result<T, ClockError>;
