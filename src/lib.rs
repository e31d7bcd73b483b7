// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! # rankfolio
//!
//! Portfolio allocation and rebalancing engine for rank-driven
//! investment strategies.
//!
//! Given a ranked universe of assets and a cash budget, the engine
//! produces an equal-weight integer-share allocation that never
//! overspends the budget; given an existing book and a fresh ranking,
//! it proposes sell/hold/buy decisions using rank-band hysteresis and
//! estimates the transaction costs of acting on them.
//!
//! ## Quick Start
//!
//! ```
//! use rustc_hash::FxHashSet;
//! use rankfolio::allocation;
//! use rankfolio::types::RankedAsset;
//!
//! let universe: Vec<RankedAsset> = (1u32..=10)
//!     .map(|i| RankedAsset::new(&format!("S{i}"), &format!("Stock {i}"), i, 100_00))
//!     .collect();
//!
//! // Invest $1,000 across the ten candidates: one $100 share each.
//! let none = FxHashSet::default();
//! let plan = allocation::plan(&universe, 1000_00, &none, &none).unwrap();
//! assert_eq!(plan.cash_remaining_cents, 0);
//! assert!(plan.lines.iter().all(|l| l.shares == 1));
//! ```
//!
//! ## Band hysteresis
//!
//! The rebalancer buys names ranked inside the buy band (default top
//! 10) but only sells holdings once they fall below the wider sell
//! band (default top 20) or drop out of the ranking. A holding at rank
//! 15 is kept, not churned:
//!
//! ```
//! use rankfolio::cost::CostParams;
//! use rankfolio::rebalance::{self, Mode, RankBands};
//! use rankfolio::types::{Holding, RankedAsset};
//!
//! let ranking: Vec<RankedAsset> = (1u32..=25)
//!     .map(|i| RankedAsset::new(&format!("S{i}"), &format!("Stock {i}"), i, 100_00))
//!     .collect();
//! let holdings = vec![Holding::new("S15", 10, 90_00)];
//!
//! let plan = rebalance::rebalance(
//!     &holdings,
//!     &ranking,
//!     &[],
//!     0,
//!     Mode::Full,
//!     RankBands::default(),
//!     &CostParams::default(),
//! )
//! .unwrap();
//!
//! assert!(plan.sells.is_empty());
//! assert_eq!(plan.holds.len(), 1);
//! ```
//!
//! ## Money representation
//!
//! All monetary values are fixed-point `i64` cents (`100_00` is
//! $100.00), so the capital conservation invariant
//! `invested + cash_remaining == budget` holds exactly — no float
//! drift. Weights and drift are `f64` fractions. The JSON boundary
//! ([`api`]) converts to decimal dollars.

pub mod allocation;
pub mod api;
pub mod audit;
pub mod config;
pub mod cost;
pub mod error;
pub mod holdings;
pub mod rebalance;
pub mod types;
pub mod universe;

pub use allocation::{AllocationLine, AllocationPlan, OptimalAmount};
pub use cost::{CostBreakdown, CostParams};
pub use error::{Error, Result, Warning};
pub use rebalance::{Decision, Mode, RankBands, RebalancePlan, Recommendation};
pub use types::{Currency, Holding, RankedAsset, Ticker};
