//! Trivia host: serves Buzzline matches over WebSocket.
//!
//! Environment:
//! - `BUZZLINE_ADDR`: listen address, default `0.0.0.0:5000`
//! - `BUZZLINE_CLUES`: path to a clue bank; the bundled bank is used if unset
//! - `BUZZLINE_MIN_YEAR`: only use categories from after this year, default 0
//! - `RUST_LOG`: log filter, default `buzzline=debug,buzzline_room=debug,trivia_host=info`

use std::num::ParseIntError;
use std::path::PathBuf;

use buzzline::prelude::*;

const BUNDLED_CLUES: &str = include_str!("../clues.json");
const DEFAULT_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_LOG_FILTER: &str = "buzzline=debug,buzzline_room=debug,trivia_host=info";

#[derive(Debug, thiserror::Error)]
enum HostError {
    #[error("invalid {key}={value:?}: {source}")]
    InvalidVar {
        key: &'static str,
        value: String,
        source: ParseIntError,
    },

    #[error(transparent)]
    Buzzline(#[from] BuzzlineError),
}

#[derive(Debug, PartialEq, Eq)]
struct HostConfig {
    addr: String,
    clues: Option<PathBuf>,
    min_year: i32,
}

impl HostConfig {
    fn from_env() -> Result<Self, HostError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HostError> {
        let min_year = match lookup("BUZZLINE_MIN_YEAR") {
            Some(raw) => raw.trim().parse().map_err(|source| HostError::InvalidVar {
                key: "BUZZLINE_MIN_YEAR",
                value: raw.clone(),
                source,
            })?,
            None => 0,
        };
        Ok(Self {
            addr: lookup("BUZZLINE_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            clues: lookup("BUZZLINE_CLUES").map(PathBuf::from),
            min_year,
        })
    }
}

async fn load_bank(path: Option<&PathBuf>) -> Result<ClueBank, BuzzlineError> {
    match path {
        Some(path) => Ok(ClueBank::load(path).await?),
        None => Ok(ClueBank::from_json(BUNDLED_CLUES)?),
    }
}

#[tokio::main]
async fn main() -> Result<(), HostError> {
    buzzline::init_tracing(DEFAULT_LOG_FILTER);

    let config = HostConfig::from_env()?;
    let bank = load_bank(config.clues.as_ref()).await?;
    tracing::info!(
        addr = %config.addr,
        categories = bank.len(),
        min_year = config.min_year,
        "starting trivia host"
    );

    let server = BuzzlineServer::builder()
        .bind(&config.addr)
        .match_config(MatchConfig {
            min_year: config.min_year,
            ..MatchConfig::default()
        })
        .build(bank)
        .await?;

    server.run().await?;
    Ok(())
}
