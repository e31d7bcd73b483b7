//! Holdings file (holdings.json) loading and validation.

use std::path::Path;

use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::{Holding, Ticker};

/// The caller's persisted portfolio state.
#[derive(Debug, Clone, Deserialize)]
pub struct HoldingsFile {
    pub holdings: Vec<HoldingEntry>,
}

/// One holding row. `cost_basis` is decimal dollars and optional — the
/// REST layer sends only ticker + shares.
#[derive(Debug, Clone, Deserialize)]
pub struct HoldingEntry {
    pub ticker: String,
    pub shares: u32,
    #[serde(default)]
    pub cost_basis: f64,
}

impl HoldingsFile {
    /// Load and validate a holdings.json file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::HoldingsRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self> {
        let file: HoldingsFile = serde_json::from_str(json)?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for entry in &self.holdings {
            if entry.ticker.is_empty() {
                return Err(Error::Holdings("empty ticker".into()));
            }
            if entry.ticker.len() > Ticker::MAX_LEN || !entry.ticker.is_ascii() {
                return Err(Error::Holdings(format!(
                    "ticker '{}' must be 1..=8 ASCII bytes",
                    entry.ticker
                )));
            }
            if entry.cost_basis < 0.0 {
                return Err(Error::Holdings(format!(
                    "negative cost basis for {}",
                    entry.ticker
                )));
            }
            if !seen.insert(entry.ticker.clone()) {
                return Err(Error::Holdings(format!("duplicate ticker: {}", entry.ticker)));
            }
        }
        Ok(())
    }

    /// Convert rows into engine holdings (cents).
    pub fn to_holdings(&self) -> Vec<Holding> {
        self.holdings
            .iter()
            .map(|entry| Holding {
                ticker: Ticker::new(&entry.ticker),
                shares: entry.shares,
                cost_basis_cents: (entry.cost_basis * 100.0).round() as i64,
            })
            .collect()
    }
}
