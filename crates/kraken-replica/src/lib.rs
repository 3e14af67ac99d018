//! Checksum-verified orderbook replica for Kraken's v1 book channel
//!
//! This crate keeps a local copy of one symbol's orderbook from decoded
//! snapshot and update messages, and verifies it against Kraken's CRC32
//! checksum after every update.
//!
//! # Constraints
//!
//! - NO networking, NO async runtime: the caller owns the transport
//! - One [`Orderbook`] per symbol
//! - Updates must be applied in exchange order
//!
//! # Example
//!
//! ```
//! use kraken_replica::{ApplyOutcome, BookState, Orderbook};
//!
//! let book = Orderbook::new();
//! assert_eq!(book.state(), BookState::Uninitialized);
//!
//! let outcome = book
//!     .apply_raw(r#"{"as":[["101.50000","1.00000000","1669902400.0"]],"bs":[["101.40000","3.00000000","1669902400.0"]]}"#)
//!     .unwrap();
//! assert_eq!(outcome, ApplyOutcome::Snapshot);
//! assert!(!book.is_empty());
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod orderbook;
pub mod storage;

// Re-export main types
pub use checksum::{compute_checksum, Checksum};
pub use config::{Ranking, ReplicaConfig, CHECKSUM_DEPTH};
pub use error::{ReplicaError, ReplicaResult};
pub use orderbook::{ApplyOutcome, BookState, BookView, Orderbook};
pub use storage::{Level, LevelTable};

// Re-export the decoder so callers need a single dependency
pub use kraken_wire;
pub use kraken_wire::{decode, decode_frame, BookFrame, LevelChange, Side, Update, UpdateKind};
