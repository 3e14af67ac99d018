//! Price level changes with decimal precision

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::messages::WireTag;

/// Fourth row element marking a level re-broadcast as a correction
pub const REPUBLISH_MARKER: &str = "r";

/// Orderbook side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Sell side, ranked low to high
    Ask,
    /// Buy side, ranked high to low
    Bid,
}

impl Side {
    /// Returns the side name as used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::Bid => "bid",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single price level change
///
/// Decimals keep the scale they were sent with, so `"1289.60000"` renders
/// back as `"1289.60000"`. The checksum depends on that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    /// Price of the level
    pub price: Decimal,
    /// New volume at this price; zero removes the level
    pub volume: Decimal,
    /// Exchange timestamp (seconds since epoch), informational only
    pub time: Decimal,
    /// Level was re-broadcast rather than newly observed
    #[serde(default)]
    pub republish: bool,
}

impl LevelChange {
    /// Create a new level change
    pub fn new(price: Decimal, volume: Decimal, time: Decimal) -> Self {
        Self {
            price,
            volume,
            time,
            republish: false,
        }
    }

    /// Mark this change as a republish
    pub fn republished(mut self) -> Self {
        self.republish = true;
        self
    }

    /// Check if this change removes its level
    pub fn is_removal(&self) -> bool {
        self.volume.is_zero()
    }

    /// Parse a `[price, volume, time]` or `[price, volume, time, marker]` row
    pub(crate) fn from_row(tag: WireTag, index: usize, row: &[String]) -> Result<Self, DecodeError> {
        let (price, volume, time, marker) = match row {
            [price, volume, time] => (price, volume, time, None),
            [price, volume, time, marker] => (price, volume, time, Some(marker.as_str())),
            _ => {
                return Err(DecodeError::MalformedLevel {
                    tag,
                    index,
                    len: row.len(),
                })
            }
        };

        let parse = |field: &'static str, value: &str| {
            parse_exact(value).ok_or_else(|| DecodeError::InvalidNumber {
                tag,
                index,
                field,
                value: value.to_string(),
            })
        };

        Ok(Self {
            price: parse("price", price.as_str())?,
            volume: parse("volume", volume.as_str())?,
            time: parse("time", time.as_str())?,
            republish: marker == Some(REPUBLISH_MARKER),
        })
    }
}

/// Parse a wire number without rounding
///
/// Only plain `[-]digits[.digits]` text is accepted. Values that do not fit a
/// `Decimal` without losing digits are rejected, since the checksum renders
/// the digits exactly as sent.
fn parse_exact(value: &str) -> Option<Decimal> {
    if !value.bytes().all(|b| b.is_ascii_digit() || b == b'.' || b == b'-') {
        return None;
    }
    Decimal::from_str_exact(value).ok()
}
