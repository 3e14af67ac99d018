//! Error types for the book decoder

use thiserror::Error;

use crate::messages::WireTag;

/// A book message that could not be decoded
///
/// Decoding never touches replica state, so every variant is fatal to the
/// offending message only.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Payload is not valid JSON or does not have the book shape
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A level row has the wrong number of fields
    #[error("Malformed level at {tag}[{index}]: expected 3 or 4 fields, got {len}")]
    MalformedLevel {
        tag: WireTag,
        index: usize,
        len: usize,
    },

    /// A price, volume or time field is not a decimal number
    #[error("Invalid {field} at {tag}[{index}]: {value:?}")]
    InvalidNumber {
        tag: WireTag,
        index: usize,
        field: &'static str,
        value: String,
    },

    /// The v1 frame envelope is not shaped like a channel message
    #[error("Unexpected frame: {0}")]
    UnexpectedFrame(String),
}

impl DecodeError {
    /// The wire tag of the offending row, if the error is row-specific
    pub fn tag(&self) -> Option<WireTag> {
        match self {
            Self::MalformedLevel { tag, .. } | Self::InvalidNumber { tag, .. } => Some(*tag),
            Self::InvalidJson(_) | Self::UnexpectedFrame(_) => None,
        }
    }
}

/// Result type alias for decoding
pub type DecodeResult<T> = Result<T, DecodeError>;
