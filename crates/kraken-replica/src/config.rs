//! Replica configuration

/// Number of levels per side covered by Kraken's checksum
pub const CHECKSUM_DEPTH: usize = 10;

/// How price levels are ranked for the checksum window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ranking {
    /// Compare prices as exact decimals
    #[default]
    Exact,
    /// Compare prices after casting to `f64`, like Kraken's reference clients.
    /// Only differs from `Exact` for prices that collide in binary floating point.
    Float,
}

/// Orderbook replica configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaConfig {
    /// Levels per side hashed into the checksum and kept after each verification
    pub checksum_depth: usize,
    /// Price ranking used when selecting the checksum window
    pub ranking: Ranking,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            checksum_depth: CHECKSUM_DEPTH,
            ranking: Ranking::Exact,
        }
    }
}

impl ReplicaConfig {
    /// Create a configuration with Kraken's defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the checksum window depth
    ///
    /// Kraken always hashes 10 levels; other values only make sense for
    /// venues that reuse the algorithm with a different window.
    pub fn with_checksum_depth(mut self, depth: usize) -> Self {
        self.checksum_depth = depth;
        self
    }

    /// Set the ranking mode
    pub fn with_ranking(mut self, ranking: Ranking) -> Self {
        self.ranking = ranking;
        self
    }
}
