//! Decoder for the Kraken WebSocket v1 `book` channel
//!
//! Turns raw book payloads into symbol-agnostic [`Update`] records that an
//! orderbook replica can apply. No networking lives here: the caller hands in
//! text it already received.
//!
//! # Key Types
//!
//! - [`RawBook`] - A book payload as it appears on the wire (`as`, `bs`, `a`, `b`, `c`)
//! - [`Update`] - Normalized snapshot or incremental update
//! - [`LevelChange`] - One price level change
//! - [`BookFrame`] - A full v1 frame with channel id, channel name and pair
//! - [`DecodeError`] - Malformed input
//!
//! # Example
//!
//! ```
//! use kraken_wire::{decode, Side};
//!
//! let update = decode(r#"{"a":[["1289.98000","0.00000000","1669985830.885322"]],"c":"512919999"}"#).unwrap();
//! assert!(!update.is_snapshot());
//! assert_eq!(update.changes(Side::Ask).len(), 1);
//! assert_eq!(update.checksum.as_deref(), Some("512919999"));
//! ```

pub mod error;
pub mod level;
pub mod messages;

pub use error::*;
pub use level::*;
pub use messages::*;

// Re-export rust_decimal for users
pub use rust_decimal::Decimal;
