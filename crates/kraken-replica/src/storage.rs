//! BTreeMap-based price level storage
//!
//! One [`LevelTable`] per side, keyed by exact decimal price. Iteration in key
//! order gives the exact ranking for free; asks read it forwards, bids in
//! reverse.

use std::collections::BTreeMap;

use kraken_wire::Side;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::Ranking;

/// A resting price level
///
/// The stored decimals keep the scale of the latest change at this price,
/// which is what the checksum renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Price of this level
    pub price: Decimal,
    /// Volume resting at this price
    pub volume: Decimal,
}

impl Level {
    /// Create a new price level
    pub fn new(price: Decimal, volume: Decimal) -> Self {
        Self { price, volume }
    }
}

/// Price levels of one side of the book
#[derive(Debug, Clone)]
pub struct LevelTable {
    side: Side,
    levels: BTreeMap<Decimal, Level>,
}

impl LevelTable {
    /// Create an empty table for a side
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Side this table holds
    pub fn side(&self) -> Side {
        self.side
    }

    /// Insert or update a level; a zero volume removes it instead
    pub fn upsert(&mut self, price: Decimal, volume: Decimal) {
        if volume.is_zero() {
            self.levels.remove(&price);
        } else {
            self.levels.insert(price, Level::new(price, volume));
        }
    }

    /// Remove a level by price
    pub fn remove(&mut self, price: &Decimal) -> Option<Level> {
        self.levels.remove(price)
    }

    /// Look up a level by price
    pub fn get(&self, price: &Decimal) -> Option<&Level> {
        self.levels.get(price)
    }

    /// Best level: lowest ask or highest bid
    pub fn best(&self) -> Option<&Level> {
        match self.side {
            Side::Ask => self.levels.values().next(),
            Side::Bid => self.levels.values().next_back(),
        }
    }

    /// All levels, best first
    pub fn ranked(&self, ranking: Ranking) -> Vec<Level> {
        let mut levels: Vec<Level> = match self.side {
            Side::Ask => self.levels.values().copied().collect(),
            Side::Bid => self.levels.values().rev().copied().collect(),
        };

        if ranking == Ranking::Float {
            // Cast once per level, then stable-sort on the cast
            let mut keyed: Vec<(f64, Level)> = levels
                .into_iter()
                .map(|level| (level.price.to_f64().unwrap_or(f64::NAN), level))
                .collect();
            match self.side {
                Side::Ask => keyed.sort_by(|a, b| a.0.total_cmp(&b.0)),
                Side::Bid => keyed.sort_by(|a, b| b.0.total_cmp(&a.0)),
            }
            levels = keyed.into_iter().map(|(_, level)| level).collect();
        }

        levels
    }

    /// Replace every level, skipping zero volumes; later duplicates win
    pub fn replace<I>(&mut self, levels: I)
    where
        I: IntoIterator<Item = (Decimal, Decimal)>,
    {
        self.levels.clear();
        for (price, volume) in levels {
            self.upsert(price, volume);
        }
    }

    /// Iterator over levels in ascending price order
    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.values()
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Clear all levels
    pub fn clear(&mut self) {
        self.levels.clear();
    }
}
