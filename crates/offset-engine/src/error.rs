//! Error types for offset-engine operations.

use thiserror::Error;

use crate::resolution::Resolution;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OffsetError {
    #[error("Invalid duration syntax: {0}")]
    InvalidDurationSyntax(String),

    #[error("Resolution overflow: {detail} exceeds the {resolution} timestamp range")]
    ResolutionOverflow {
        resolution: Resolution,
        detail: String,
    },

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimeZone(String),

    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Nonexistent local time: {0}")]
    NonexistentLocalTime(String),
}

pub type Result<T> = std::result::Result<T, OffsetError>;
