//! TOML configuration loading and validation.

use std::path::Path;

use serde::Deserialize;

use crate::cost::CostParams;
use crate::error::{Error, Result};
use crate::rebalance::RankBands;

/// Top-level engine configuration. Every section and field has a
/// default, so a missing file or an empty one is a valid config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub bands: BandConfig,
    #[serde(default)]
    pub costs: CostConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Portfolio selection: how many top-ranked assets form the target
/// universe, and how many of the next band to surface as substitutes.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioConfig {
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default = "default_substitute_depth")]
    pub substitute_depth: usize,
}

fn default_size() -> usize {
    10
}
fn default_substitute_depth() -> usize {
    5
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            substitute_depth: default_substitute_depth(),
        }
    }
}

/// Rank band thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct BandConfig {
    #[serde(default = "default_buy_rank")]
    pub buy_rank_threshold: u32,
    #[serde(default = "default_sell_rank")]
    pub sell_rank_threshold: u32,
}

fn default_buy_rank() -> u32 {
    10
}
fn default_sell_rank() -> u32 {
    20
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            buy_rank_threshold: default_buy_rank(),
            sell_rank_threshold: default_sell_rank(),
        }
    }
}

/// Transaction cost assumptions. Rates are fractions; `fee_floor` is
/// decimal dollars per trade.
#[derive(Debug, Clone, Deserialize)]
pub struct CostConfig {
    #[serde(default = "default_fee_rate")]
    pub fee_rate: f64,
    #[serde(default = "default_fee_floor")]
    pub fee_floor: f64,
    #[serde(default = "default_spread_rate")]
    pub spread_rate: f64,
}

fn default_fee_rate() -> f64 {
    0.00069
}
fn default_fee_floor() -> f64 {
    1.0
}
fn default_spread_rate() -> f64 {
    0.003
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            fee_rate: default_fee_rate(),
            fee_floor: default_fee_floor(),
            spread_rate: default_spread_rate(),
        }
    }
}

/// Audit trail location.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

impl EngineConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: EngineConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.portfolio.size == 0 {
            return Err(Error::Config("portfolio size must be >= 1".into()));
        }
        self.rank_bands().validate()?;
        if self.costs.fee_rate < 0.0 || self.costs.spread_rate < 0.0 {
            return Err(Error::Config("cost rates must be >= 0".into()));
        }
        if self.costs.fee_floor < 0.0 {
            return Err(Error::Config("fee_floor must be >= 0".into()));
        }
        Ok(())
    }

    /// Band thresholds for the rebalancer.
    pub fn rank_bands(&self) -> RankBands {
        RankBands {
            buy_rank_threshold: self.bands.buy_rank_threshold,
            sell_rank_threshold: self.bands.sell_rank_threshold,
        }
    }

    /// Cost parameters for the estimator (floor converted to cents).
    pub fn cost_params(&self) -> CostParams {
        CostParams {
            fee_rate: self.costs.fee_rate,
            fee_floor_cents: (self.costs.fee_floor * 100.0).round() as i64,
            spread_rate: self.costs.spread_rate,
        }
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> std::path::PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}
