//! Error types for the orderbook replica

use kraken_wire::DecodeError;
use thiserror::Error;

use crate::checksum::Checksum;

/// Errors surfaced by [`Orderbook`](crate::Orderbook) operations
#[derive(Error, Debug)]
pub enum ReplicaError {
    /// The replica no longer matches the exchange's book
    ///
    /// The update that exposed the mismatch is already applied. Recover by
    /// applying a fresh snapshot, or by discarding the replica.
    #[error("Checksum mismatch: computed {computed}, expected {expected:?}")]
    ChecksumMismatch {
        /// Checksum of the replica after the update
        computed: Checksum,
        /// Checksum declared by the exchange (empty if none was sent)
        expected: String,
    },

    /// The raw message could not be decoded; the replica is untouched
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The reporting view could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReplicaError {
    /// Returns true if recovery needs a fresh snapshot
    pub fn requires_snapshot(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
    }

    /// Returns true if only the offending message should be dropped
    pub fn is_message_local(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Result type alias for replica operations
pub type ReplicaResult<T> = Result<T, ReplicaError>;
