//! Ranked universe snapshot (universe.json) loading and validation.

use std::path::Path;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::{Currency, RankedAsset, Ticker};

/// A ranked universe snapshot from the external ranking service.
///
/// One snapshot feeds one computation; the engine never refreshes it.
#[derive(Debug, Clone, Deserialize)]
pub struct UniverseSnapshot {
    pub timestamp: DateTime<Utc>,
    pub assets: Vec<AssetEntry>,
}

/// One asset row as it appears in the snapshot file.
///
/// Prices are decimal dollars here; [`UniverseSnapshot::to_assets`]
/// converts to fixed-point cents.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetEntry {
    pub ticker: String,
    pub name: String,
    pub rank: u32,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Price converted to the base currency; defaults to `price`.
    #[serde(default)]
    pub price_base: Option<f64>,
}

fn default_currency() -> String {
    "USD".into()
}

impl UniverseSnapshot {
    /// Load and validate a universe.json file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::UniverseRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: UniverseSnapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Validate the snapshot.
    ///
    /// Tickers must be 1..=8 ASCII bytes, currencies 3 ASCII bytes.
    /// Duplicate tickers or rank values are fatal (band membership would
    /// be ambiguous); ranks must be dense `1..=N`. Non-positive prices
    /// pass validation — the planner drops them per asset with a
    /// warning.
    fn validate(&self) -> Result<()> {
        let mut tickers = FxHashSet::default();
        let mut ranks: Vec<u32> = Vec::with_capacity(self.assets.len());

        for entry in &self.assets {
            if entry.ticker.is_empty() {
                return Err(Error::Universe("empty ticker".into()));
            }
            if entry.ticker.len() > Ticker::MAX_LEN || !entry.ticker.is_ascii() {
                return Err(Error::Universe(format!(
                    "ticker '{}' must be 1..=8 ASCII bytes",
                    entry.ticker
                )));
            }
            if entry.currency.len() != 3 || !entry.currency.is_ascii() {
                return Err(Error::Universe(format!(
                    "currency '{}' for {} must be a 3-letter code",
                    entry.currency, entry.ticker
                )));
            }
            if !tickers.insert(entry.ticker.clone()) {
                return Err(Error::DuplicateRank(format!("ticker {}", entry.ticker)));
            }
            ranks.push(entry.rank);
        }

        ranks.sort_unstable();
        for (i, &rank) in ranks.iter().enumerate() {
            let expected = i as u32 + 1;
            if rank != expected {
                return Err(if ranks[..i].contains(&rank) {
                    Error::DuplicateRank(format!("rank {rank}"))
                } else {
                    Error::Universe(format!(
                        "ranks must be dense 1..={}, missing rank {expected}",
                        ranks.len()
                    ))
                });
            }
        }

        Ok(())
    }

    /// Convert the snapshot rows into engine assets (cents).
    pub fn to_assets(&self) -> Vec<RankedAsset> {
        self.assets
            .iter()
            .map(|entry| {
                let price_cents = to_cents(entry.price);
                RankedAsset {
                    ticker: Ticker::new(&entry.ticker),
                    name: entry.name.clone(),
                    rank: entry.rank,
                    price_cents,
                    currency: Currency::new(&entry.currency),
                    price_base_cents: entry.price_base.map_or(price_cents, to_cents),
                }
            })
            .collect()
    }
}

/// Decimal dollars to fixed-point cents.
fn to_cents(dollars: f64) -> i64 {
    (dollars * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json() -> &'static str {
        r#"{
            "timestamp": "2026-08-01T06:00:00Z",
            "assets": [
                { "ticker": "AAPL", "name": "Apple Inc.", "rank": 1, "price": 185.00 },
                { "ticker": "MSFT", "name": "Microsoft", "rank": 2, "price": 410.50 },
                { "ticker": "EVO",  "name": "Evolution AB", "rank": 3, "price": 1020.0,
                  "currency": "SEK", "price_base": 97.15 }
            ]
        }"#
    }

    #[test]
    fn parse_valid_snapshot() {
        let snapshot = UniverseSnapshot::from_json(valid_json()).unwrap();
        assert_eq!(snapshot.assets.len(), 3);
        assert_eq!(snapshot.assets[0].ticker, "AAPL");
        assert_eq!(snapshot.assets[2].currency, "SEK");
    }

    #[test]
    fn to_assets_converts_to_cents() {
        let snapshot = UniverseSnapshot::from_json(valid_json()).unwrap();
        let assets = snapshot.to_assets();
        assert_eq!(assets[0].price_cents, 185_00);
        assert_eq!(assets[1].price_cents, 410_50);
        // Base price differs from native for the SEK asset.
        assert_eq!(assets[2].price_cents, 1020_00);
        assert_eq!(assets[2].price_base_cents, 97_15);
        // USD assets default base to native.
        assert_eq!(assets[0].price_base_cents, 185_00);
    }

    #[test]
    fn reject_duplicate_ticker() {
        let json = r#"{
            "timestamp": "2026-08-01T06:00:00Z",
            "assets": [
                { "ticker": "AAPL", "name": "Apple", "rank": 1, "price": 185.0 },
                { "ticker": "AAPL", "name": "Apple again", "rank": 2, "price": 185.0 }
            ]
        }"#;
        assert!(matches!(
            UniverseSnapshot::from_json(json),
            Err(Error::DuplicateRank(_))
        ));
    }

    #[test]
    fn reject_duplicate_rank() {
        let json = r#"{
            "timestamp": "2026-08-01T06:00:00Z",
            "assets": [
                { "ticker": "AAPL", "name": "Apple", "rank": 1, "price": 185.0 },
                { "ticker": "MSFT", "name": "Microsoft", "rank": 1, "price": 410.0 }
            ]
        }"#;
        assert!(matches!(
            UniverseSnapshot::from_json(json),
            Err(Error::DuplicateRank(_))
        ));
    }

    #[test]
    fn reject_rank_gap() {
        let json = r#"{
            "timestamp": "2026-08-01T06:00:00Z",
            "assets": [
                { "ticker": "AAPL", "name": "Apple", "rank": 1, "price": 185.0 },
                { "ticker": "MSFT", "name": "Microsoft", "rank": 3, "price": 410.0 }
            ]
        }"#;
        assert!(matches!(
            UniverseSnapshot::from_json(json),
            Err(Error::Universe(_))
        ));
    }

    #[test]
    fn reject_long_ticker() {
        let json = r#"{
            "timestamp": "2026-08-01T06:00:00Z",
            "assets": [
                { "ticker": "TOOLONGNAME", "name": "Bad", "rank": 1, "price": 10.0 }
            ]
        }"#;
        assert!(UniverseSnapshot::from_json(json).is_err());
    }

    #[test]
    fn reject_empty_ticker() {
        let json = r#"{
            "timestamp": "2026-08-01T06:00:00Z",
            "assets": [
                { "ticker": "", "name": "Bad", "rank": 1, "price": 10.0 }
            ]
        }"#;
        assert!(UniverseSnapshot::from_json(json).is_err());
    }

    #[test]
    fn reject_bad_currency() {
        let json = r#"{
            "timestamp": "2026-08-01T06:00:00Z",
            "assets": [
                { "ticker": "AAPL", "name": "Apple", "rank": 1, "price": 185.0, "currency": "DOLLARS" }
            ]
        }"#;
        assert!(UniverseSnapshot::from_json(json).is_err());
    }

    #[test]
    fn empty_universe_is_valid() {
        let json = r#"{ "timestamp": "2026-08-01T06:00:00Z", "assets": [] }"#;
        let snapshot = UniverseSnapshot::from_json(json).unwrap();
        assert!(snapshot.to_assets().is_empty());
    }

    #[test]
    fn non_positive_price_passes_load() {
        // The planner handles bad prices per asset; loading keeps them.
        let json = r#"{
            "timestamp": "2026-08-01T06:00:00Z",
            "assets": [
                { "ticker": "BAD", "name": "Bad Price", "rank": 1, "price": 0.0 }
            ]
        }"#;
        let snapshot = UniverseSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.to_assets()[0].price_cents, 0);
    }
}
