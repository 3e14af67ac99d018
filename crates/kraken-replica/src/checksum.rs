//! CRC32 checksum validation for orderbook integrity
//!
//! Implements Kraken's v1 book checksum to detect a replica drifting from the
//! exchange.
//!
//! # Algorithm
//!
//! 1. Use the top 10 levels of each side only
//! 2. Process asks first (sorted low→high), then bids (sorted high→low)
//! 3. For each level: take price then volume as sent, remove the decimal point, strip leading zeros
//! 4. Concatenate all: asks_string + bids_string
//! 5. Apply standard CRC32 (ISO 3309, polynomial 0xEDB88320)
//! 6. Render as an unsigned base-10 integer
//!
//! Kraken v1 sends prices and volumes as strings with a fixed number of
//! decimals per pair, and `Decimal` keeps that scale, so no precision table
//! is needed.

use crc32fast::Hasher;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::storage::Level;

/// A computed book checksum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(u32);

impl Checksum {
    /// Wrap a raw CRC32 value
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// The raw CRC32 value
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Compare against a checksum declared on the wire
    ///
    /// Kraken declares checksums as base-10 strings, so this is a string
    /// comparison: a malformed or missing declaration never matches.
    pub fn matches(&self, declared: &str) -> bool {
        self.to_string() == declared
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Checksum> for u32 {
    fn from(checksum: Checksum) -> Self {
        checksum.0
    }
}

/// Compute Kraken's CRC32 checksum over ranked levels
///
/// # Arguments
///
/// * `asks` - Ask levels sorted low to high (best ask first)
/// * `bids` - Bid levels sorted high to low (best bid first)
/// * `depth` - Levels per side to hash (10 for Kraken)
pub fn compute_checksum<'a, A, B>(asks: A, bids: B, depth: usize) -> Checksum
where
    A: IntoIterator<Item = &'a Level>,
    B: IntoIterator<Item = &'a Level>,
{
    let mut hasher = Hasher::new();

    for level in asks.into_iter().take(depth).chain(bids.into_iter().take(depth)) {
        hasher.update(format_for_checksum(&level.price).as_bytes());
        hasher.update(format_for_checksum(&level.volume).as_bytes());
    }

    Checksum(hasher.finalize())
}

/// Format a decimal for the checksum string
///
/// Uses the decimal's own scale, then:
/// 1. Remove the decimal point
/// 2. Strip leading zeros
///
/// # Examples
///
/// - 1289.60000 → "128960000"
/// - 0.01551181 → "001551181" → "1551181"
fn format_for_checksum(value: &Decimal) -> String {
    value
        .to_string()
        .replace('.', "")
        .trim_start_matches('0')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_for_checksum() {
        assert_eq!(format_for_checksum(&dec!(1289.60000)), "128960000");
        assert_eq!(format_for_checksum(&dec!(0.01551181)), "1551181");
        assert_eq!(format_for_checksum(&dec!(34.36979734)), "3436979734");
        assert_eq!(format_for_checksum(&dec!(0.00100000)), "100000");
        assert_eq!(format_for_checksum(&dec!(100)), "100");
    }

    #[test]
    fn test_known_value() {
        // "12345678" hashed with CRC32/ISO-HDLC
        let asks = [Level::new(dec!(1.234), dec!(0.5678))];
        let bids: [Level; 0] = [];
        assert_eq!(compute_checksum(&asks, &bids, 10).value(), 0x9AE0DAAF);
    }

    #[test]
    fn test_checksum_order_matters() {
        let level1 = Level::new(dec!(100), dec!(1));
        let level2 = Level::new(dec!(101), dec!(2));

        let checksum1 = compute_checksum(&[level1], &[level2], 10);
        let checksum2 = compute_checksum(&[level2], &[level1], 10);

        assert_ne!(checksum1, checksum2);
    }

    #[test]
    fn test_checksum_uses_top_10() {
        let mut asks: Vec<Level> = (1..=15)
            .map(|i| Level::new(Decimal::from(100 + i), dec!(1)))
            .collect();
        let mut bids: Vec<Level> = (1..=15)
            .map(|i| Level::new(Decimal::from(100 - i), dec!(1)))
            .collect();

        let checksum1 = compute_checksum(&asks, &bids, 10);

        asks.push(Level::new(dec!(200), dec!(1)));
        bids.push(Level::new(dec!(1), dec!(1)));

        let checksum2 = compute_checksum(&asks, &bids, 10);
        assert_eq!(checksum1, checksum2);
    }

    #[test]
    fn test_matches_is_string_equality() {
        let checksum = Checksum::new(820124158);
        assert!(checksum.matches("820124158"));
        assert!(!checksum.matches("820124159"));
        assert!(!checksum.matches("0820124158"));
        assert!(!checksum.matches(""));
        assert_eq!(u32::from(checksum), 820124158);
    }
}
