//! Common test utilities and fixtures for integration tests
//!
//! Fixtures are book payloads recorded from Kraken's v1 `book-10` channel for
//! ETH/USD, one payload per line.

#![allow(dead_code)]

use kraken_replica::{decode, Update};

/// 1 snapshot + 7 updates; the last update's checksum was incremented by 1
pub const CHECKSUM_FAULT: &str = include_str!("../fixtures/checksum_fault.jsonl");

/// 1 snapshot + 14 updates that once tripped a naive checksum implementation
pub const DESYNC_RECOVERY: &str = include_str!("../fixtures/desync_recovery.jsonl");

/// 1 snapshot + 288 updates, all correctly checksummed
pub const LIVE_SESSION: &str = include_str!("../fixtures/live_session.jsonl");

/// Snapshot with 10 asks and 10 bids at distinct prices
pub const TEN_BY_TEN_SNAPSHOT: &str = r#"{
    "as": [
        ["1272.70000", "1.00000000", "1669902400.000000"],
        ["1272.71000", "1.50000000", "1669902400.000000"],
        ["1272.72000", "2.00000000", "1669902400.000000"],
        ["1272.73000", "2.50000000", "1669902400.000000"],
        ["1272.74000", "3.00000000", "1669902400.000000"],
        ["1272.75000", "3.50000000", "1669902400.000000"],
        ["1272.76000", "4.00000000", "1669902400.000000"],
        ["1272.77000", "4.50000000", "1669902400.000000"],
        ["1272.78000", "5.00000000", "1669902400.000000"],
        ["1272.79000", "5.50000000", "1669902400.000000"]
    ],
    "bs": [
        ["1271.80000", "2.00000000", "1669902400.000000"],
        ["1271.79000", "2.25000000", "1669902400.000000"],
        ["1271.78000", "2.50000000", "1669902400.000000"],
        ["1271.77000", "2.75000000", "1669902400.000000"],
        ["1271.76000", "3.00000000", "1669902400.000000"],
        ["1271.75000", "3.25000000", "1669902400.000000"],
        ["1271.74000", "3.50000000", "1669902400.000000"],
        ["1271.73000", "3.75000000", "1669902400.000000"],
        ["1271.72000", "4.00000000", "1669902400.000000"],
        ["1271.71000", "4.25000000", "1669902400.000000"]
    ]
}"#;

/// Checksum of `TEN_BY_TEN_SNAPSHOT`
pub const TEN_BY_TEN_CHECKSUM: &str = "1407233469";

/// Deletes the best ask, adds asks at rank 10 and 11 and a new best bid
pub const TEN_BY_TEN_UPDATE: &str = r#"{
    "a": [
        ["1272.70000", "0.00000000", "1669902401.000000"],
        ["1272.85000", "0.40000000", "1669902401.000000"],
        ["1272.90000", "0.60000000", "1669902390.000000", "r"]
    ],
    "b": [
        ["1271.85000", "1.10000000", "1669902401.000000"]
    ],
    "c": "2581166476"
}"#;

/// Decode every line of a fixture
pub fn updates(fixture: &str) -> Vec<Update> {
    fixture
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| decode(line).expect("fixture line should decode"))
        .collect()
}
