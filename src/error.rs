//! Error types and non-fatal plan warnings.

use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

use crate::types::Ticker;

/// All errors that can abort a plan or rebalance computation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid budget: {0} cents (must be > 0)")]
    InvalidBudget(i64),

    #[error("invalid new capital: {0} cents (must be >= 0)")]
    InvalidCapital(i64),

    /// Fatal for the whole call: duplicate tickers or rank values make
    /// band membership ambiguous.
    #[error("duplicate rank in universe: {0}")]
    DuplicateRank(String),

    #[error("universe error: {0}")]
    Universe(String),

    #[error("failed to read universe file {path}: {source}")]
    UniverseRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("holdings error: {0}")]
    Holdings(String),

    #[error("failed to read holdings file {path}: {source}")]
    HoldingsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A recoverable, per-asset problem surfaced alongside a valid plan.
///
/// Warnings render as stable machine-readable strings
/// (`invalid_price:TICK`) so the presentation layer can match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// Asset had a non-positive price and was dropped from the plan.
    InvalidPrice(Ticker),
    /// The candidate set was empty; the plan allocates nothing.
    EmptyUniverse,
    /// A held ticker had no price in the ranking or quotes; its cost
    /// basis was used for valuation instead.
    MissingQuote(Ticker),
    /// A manual share adjustment referenced a ticker not in the plan.
    UnknownAdjustment(Ticker),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InvalidPrice(t) => write!(f, "invalid_price:{t}"),
            Warning::EmptyUniverse => write!(f, "empty_universe"),
            Warning::MissingQuote(t) => write!(f, "missing_quote:{t}"),
            Warning::UnknownAdjustment(t) => write!(f, "unknown_adjustment:{t}"),
        }
    }
}

impl Serialize for Warning {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
