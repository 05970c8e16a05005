//! Error types for the dispatcher.
//!
//! Range violations on live cabin state are never errors: they are clamped and logged
//! where they happen (see [`crate::elevator_logic::cabin`]). What remains here are the
//! failures a caller can act on: a bank that cannot be built, a hall call outside the
//! building, and input lines that do not parse.

use thiserror::Error;

/// Dispatcher error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// A bank needs at least one elevator
    #[error("a dispatcher needs at least one elevator")]
    NoElevators,

    /// The top floor must be above the bottom terminal
    #[error("top floor must be at least 1, got {0}")]
    InvalidTopFloor(i32),

    /// The stop sentinel collides with a real floor
    #[error("stop sentinel {0} is a real floor")]
    StopSentinelInRange(i32),

    /// Workers are spawned on the tokio runtime the dispatcher was built in
    #[error("dispatcher must be created inside a tokio runtime")]
    NoRuntime,

    /// Floor argument outside the building
    #[error("floor {floor} outside 0..={top}")]
    FloorOutOfRange {
        /// Requested floor
        floor: i32,
        /// Top floor of the building
        top: i32,
    },

    /// Direction argument not in {-1, 0, 1}
    #[error("direction {0} is not one of -1, 0, 1")]
    InvalidDirection(i32),

    /// Elevator number not in the bank
    #[error("no elevator numbered {0}")]
    UnknownElevator(usize),

    /// Input line that could not be parsed
    #[error("malformed command: {0:?}")]
    MalformedCommand(String),
}

/// Result type alias using [`DispatchError`]
pub type Result<T> = std::result::Result<T, DispatchError>;
