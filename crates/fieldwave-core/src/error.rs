//! Error types for the fieldwave runtime

use thiserror::Error;

use crate::DeviceId;

/// Core fieldwave errors
///
/// Missing neighbor data and alignment mismatches are not represented here:
/// both are ordinary outcomes of a round and only show up in round reports.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldwaveError {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Wire errors
    #[error("Invalid wire format: {0}")]
    InvalidWireFormat(String),

    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("Unknown value tag: {0:#04x}")]
    UnknownValueTag(u8),

    #[error("Unsupported wire version: {0}")]
    UnsupportedVersion(u8),

    #[error("Value nesting deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("Frame too large: {size} > {max}")]
    FrameTooLarge { size: usize, max: usize },

    // Network errors
    #[error("Unknown device: {0}")]
    UnknownDevice(DeviceId),

    #[error("Duplicate device: {0}")]
    DuplicateDevice(DeviceId),
}

/// Result type for fieldwave operations
pub type FieldwaveResult<T> = Result<T, FieldwaveError>;
