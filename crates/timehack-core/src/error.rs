//! Error types for TIMEHACK

use thiserror::Error;

/// Core TIMEHACK errors
///
/// None of these are fatal to the frame loop: source failures are absorbed by
/// ClockSync, and configuration/zone errors only surface at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HackError {
    // Authority errors
    #[error("Time source unavailable: every endpoint failed")]
    SourceUnavailable,

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    // Transport errors
    #[error("Transport error: {0}")]
    TransportError(String),

    // Calendar errors
    #[error("Unknown time zone: {0}")]
    UnknownZone(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration: {0}")]
    ConfigIo(String),
}

/// Result type for TIMEHACK operations
pub type HackResult<T> = Result<T, HackError>;
