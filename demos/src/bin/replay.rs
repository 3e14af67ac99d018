//! Demo: Recorded Session Replay
//!
//! Showcases: frame decoding, checksum verification, reporting view
//!
//! Feeds recorded Kraken v1 WebSocket frames (one per line) through the
//! decoder and a single orderbook replica, printing the book as JSON after
//! every applied book message.
//!
//! Run: cargo run --bin replay -- --pair ETH/USD demos/data/eth_usd_frames.jsonl
//!
//! Reads stdin when no file is given. Log verbosity follows `RUST_LOG`.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use clap::Parser;
use kraken_replica::{decode, decode_frame, ApplyOutcome, Orderbook, ReplicaError, Update};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "replay")]
#[command(about = "Replay recorded Kraken book frames through an orderbook replica")]
struct Args {
    /// Only apply frames for this pair, e.g. ETH/USD
    #[arg(long)]
    pair: Option<String>,

    /// Treat every line as a bare book payload instead of a full frame
    #[arg(long)]
    payloads: bool,

    /// File with one message per line (stdin if omitted)
    path: Option<PathBuf>,
}

/// Decode one input line into an update, or `None` if it should be skipped
fn next_update(line: &str, args: &Args) -> Result<Option<Update>, ReplicaError> {
    if args.payloads {
        return Ok(Some(decode(line)?));
    }

    let Some(frame) = decode_frame(line)? else {
        return Ok(None);
    };

    if args.pair.as_deref().is_some_and(|pair| pair != frame.pair) {
        return Ok(None);
    }

    Ok(Some(frame.update))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let input: Box<dyn BufRead> = match &args.path {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let book = Orderbook::new();
    let mut verified = 0u64;
    let mut mismatches = 0u64;

    for (line_no, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let update = match next_update(&line, &args) {
            Ok(Some(update)) => update,
            Ok(None) => continue,
            Err(err) => {
                warn!(line = line_no + 1, %err, "Dropping undecodable message");
                continue;
            }
        };

        match book.apply(&update) {
            Ok(ApplyOutcome::Snapshot) => {
                info!(line = line_no + 1, "Snapshot loaded");
            }
            Ok(ApplyOutcome::Verified(_)) => verified += 1,
            Err(err) if err.requires_snapshot() => {
                mismatches += 1;
                error!(line = line_no + 1, %err, "Replica desynchronized, waiting for snapshot");
            }
            Err(err) => return Err(err.into()),
        }

        println!("{}", book.to_json()?);
    }

    info!(verified, mismatches, state = ?book.state(), "Replay finished");
    Ok(())
}
