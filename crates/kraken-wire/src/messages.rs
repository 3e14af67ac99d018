//! Book channel payloads and their normalization into updates

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DecodeError, LevelChange, Side};

// ============================================================================
// Wire Types
// ============================================================================

/// The four tagged level arrays a book payload may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireTag {
    /// `as` - ask rows of a snapshot
    AskSnapshot,
    /// `bs` - bid rows of a snapshot
    BidSnapshot,
    /// `a` - ask rows of an incremental update
    AskUpdate,
    /// `b` - bid rows of an incremental update
    BidUpdate,
}

impl WireTag {
    /// Returns the tag as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AskSnapshot => "as",
            Self::BidSnapshot => "bs",
            Self::AskUpdate => "a",
            Self::BidUpdate => "b",
        }
    }

    /// Side the rows under this tag belong to
    pub fn side(&self) -> Side {
        match self {
            Self::AskSnapshot | Self::AskUpdate => Side::Ask,
            Self::BidSnapshot | Self::BidUpdate => Side::Bid,
        }
    }

    /// Returns true for the snapshot tags
    pub fn is_snapshot(&self) -> bool {
        matches!(self, Self::AskSnapshot | Self::BidSnapshot)
    }

    /// Tags feeding one side, in concatenation order
    pub fn for_side(side: Side) -> [WireTag; 2] {
        match side {
            Side::Ask => [Self::AskUpdate, Self::AskSnapshot],
            Side::Bid => [Self::BidUpdate, Self::BidSnapshot],
        }
    }
}

impl std::fmt::Display for WireTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Book payload exactly as sent on the wire
///
/// Rows are kept as strings; Kraken v1 quotes every number in book rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBook {
    /// Ask snapshot rows
    #[serde(rename = "as", default, skip_serializing_if = "Vec::is_empty")]
    pub ask_snapshot: Vec<Vec<String>>,
    /// Bid snapshot rows
    #[serde(rename = "bs", default, skip_serializing_if = "Vec::is_empty")]
    pub bid_snapshot: Vec<Vec<String>>,
    /// Ask update rows
    #[serde(rename = "a", default, skip_serializing_if = "Vec::is_empty")]
    pub ask_update: Vec<Vec<String>>,
    /// Bid update rows
    #[serde(rename = "b", default, skip_serializing_if = "Vec::is_empty")]
    pub bid_update: Vec<Vec<String>>,
    /// CRC32 checksum rendered as a base-10 string (updates only)
    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl RawBook {
    /// Rows carried under a tag
    pub fn rows(&self, tag: WireTag) -> &[Vec<String>] {
        match tag {
            WireTag::AskSnapshot => &self.ask_snapshot,
            WireTag::BidSnapshot => &self.bid_snapshot,
            WireTag::AskUpdate => &self.ask_update,
            WireTag::BidUpdate => &self.bid_update,
        }
    }

    /// Declared checksum; an empty string counts as absent
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref().filter(|c| !c.is_empty())
    }

    /// A payload is a snapshot only when both snapshot arrays have rows and
    /// no checksum is declared.
    pub fn is_snapshot(&self) -> bool {
        !self.ask_snapshot.is_empty() && !self.bid_snapshot.is_empty() && self.checksum().is_none()
    }

    /// Append another payload of the same frame
    ///
    /// Kraken splits an update touching both sides into two objects; only the
    /// last one carries the checksum.
    pub fn merge(&mut self, other: RawBook) {
        self.ask_snapshot.extend(other.ask_snapshot);
        self.bid_snapshot.extend(other.bid_snapshot);
        self.ask_update.extend(other.ask_update);
        self.bid_update.extend(other.bid_update);
        if other.checksum.as_deref().is_some_and(|c| !c.is_empty()) {
            self.checksum = other.checksum;
        }
    }

    /// Normalize into an [`Update`]
    pub fn into_update(self) -> Result<Update, DecodeError> {
        let kind = if self.is_snapshot() {
            UpdateKind::Snapshot
        } else {
            UpdateKind::Incremental
        };

        let asks = self.side_changes(Side::Ask)?;
        let bids = self.side_changes(Side::Bid)?;
        let checksum = self.checksum().map(str::to_owned);

        Ok(Update {
            kind,
            asks,
            bids,
            checksum,
        })
    }

    fn side_changes(&self, side: Side) -> Result<Vec<LevelChange>, DecodeError> {
        let mut changes = Vec::new();
        for tag in WireTag::for_side(side) {
            for (index, row) in self.rows(tag).iter().enumerate() {
                changes.push(LevelChange::from_row(tag, index, row)?);
            }
        }
        Ok(changes)
    }
}

// ============================================================================
// Normalized Updates
// ============================================================================

/// Whether an update replaces the book or patches it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    /// Full replacement of both sides
    Snapshot,
    /// Diff against the current book, verified by checksum
    Incremental,
}

/// Symbol-agnostic book update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    /// Snapshot or incremental
    pub kind: UpdateKind,
    /// Ask changes in wire order
    pub asks: Vec<LevelChange>,
    /// Bid changes in wire order
    pub bids: Vec<LevelChange>,
    /// Declared checksum (incremental updates only)
    pub checksum: Option<String>,
}

impl Update {
    /// Create a snapshot update
    pub fn snapshot(asks: Vec<LevelChange>, bids: Vec<LevelChange>) -> Self {
        Self {
            kind: UpdateKind::Snapshot,
            asks,
            bids,
            checksum: None,
        }
    }

    /// Create an incremental update with its declared checksum
    pub fn incremental(
        asks: Vec<LevelChange>,
        bids: Vec<LevelChange>,
        checksum: impl Into<String>,
    ) -> Self {
        Self {
            kind: UpdateKind::Incremental,
            asks,
            bids,
            checksum: Some(checksum.into()),
        }
    }

    /// Check if this update is a snapshot
    pub fn is_snapshot(&self) -> bool {
        self.kind == UpdateKind::Snapshot
    }

    /// Changes for one side
    pub fn changes(&self, side: Side) -> &[LevelChange] {
        match side {
            Side::Ask => &self.asks,
            Side::Bid => &self.bids,
        }
    }

    /// Number of republished rows on both sides
    pub fn republished(&self) -> usize {
        self.asks
            .iter()
            .chain(&self.bids)
            .filter(|level| level.republish)
            .count()
    }
}

/// Decode one book payload object
pub fn decode(raw: &str) -> Result<Update, DecodeError> {
    let book: RawBook = serde_json::from_str(raw)?;
    book.into_update()
}

// ============================================================================
// Frame Envelope
// ============================================================================

/// A v1 book frame: `[channelID, payload, (payload,) channelName, pair]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFrame {
    /// Channel id assigned at subscription
    pub channel_id: u64,
    /// Channel name, e.g. `book-10`
    pub channel_name: String,
    /// Trading pair, e.g. `ETH/USD`
    pub pair: String,
    /// Decoded payload(s)
    pub update: Update,
}

/// Decode a full WebSocket text frame
///
/// Returns `Ok(None)` for frames that are not book data: event objects
/// (heartbeats, subscription status) and arrays of other channels.
pub fn decode_frame(raw: &str) -> Result<Option<BookFrame>, DecodeError> {
    let items = match serde_json::from_str::<Value>(raw)? {
        Value::Object(_) => return Ok(None),
        Value::Array(items) => items,
        other => {
            return Err(DecodeError::UnexpectedFrame(format!(
                "expected array or object, got {other}"
            )))
        }
    };

    if items.len() < 4 {
        return Err(DecodeError::UnexpectedFrame(format!(
            "channel frame needs at least 4 elements, got {}",
            items.len()
        )));
    }

    let mut items = items.into_iter();
    let channel_id = items
        .next()
        .and_then(|v| v.as_u64())
        .ok_or_else(|| DecodeError::UnexpectedFrame("channel id is not an integer".into()))?;

    let mut rest: Vec<Value> = items.collect();
    let pair = take_string(rest.pop(), "pair")?;
    let channel_name = take_string(rest.pop(), "channel name")?;

    if !channel_name.starts_with("book") {
        return Ok(None);
    }

    let mut book = RawBook::default();
    for payload in rest {
        book.merge(serde_json::from_value(payload)?);
    }

    Ok(Some(BookFrame {
        channel_id,
        channel_name,
        pair,
        update: book.into_update()?,
    }))
}

fn take_string(value: Option<Value>, what: &str) -> Result<String, DecodeError> {
    match value {
        Some(Value::String(s)) => Ok(s),
        _ => Err(DecodeError::UnexpectedFrame(format!("{what} is not a string"))),
    }
}
