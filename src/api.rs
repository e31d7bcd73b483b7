//! JSON request/response layer for the dashboard endpoints.
//!
//! The engine itself works in fixed-point cents over [`crate::types`]
//! values; this module owns the decimal-dollar DTO shapes the REST
//! layer and CLI exchange, plus top-K universe selection and the
//! next-band substitute listing.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::allocation;
use crate::config::EngineConfig;
use crate::cost::CostBreakdown;
use crate::error::{Error, Result};
use crate::rebalance::{self, Mode, Recommendation};
use crate::types::{Holding, RankedAsset, Ticker};

/// Allocation request: invest `amount` dollars across the top-ranked
/// universe, minus `excluded_tickers`, forcing `forced_tickers` in.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanRequest {
    pub amount: f64,
    #[serde(default)]
    pub excluded_tickers: Vec<String>,
    #[serde(default)]
    pub forced_tickers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub allocations: Vec<AllocationEntry>,
    pub summary: PlanSummary,
    pub warnings: Vec<String>,
    pub optimal_amounts: Vec<OptimalAmountEntry>,
    /// Next-rank-band candidates that would fill excluded slots.
    pub substitutes: Vec<SubstituteEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationEntry {
    pub ticker: String,
    pub name: String,
    pub rank: u32,
    pub shares: u32,
    pub price: f64,
    pub amount: f64,
    pub target_weight: f64,
    pub actual_weight: f64,
    pub deviation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub total_invested: f64,
    pub cash_remaining: f64,
    pub utilization: f64,
    pub max_deviation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimalAmountEntry {
    pub amount: f64,
    pub max_deviation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubstituteEntry {
    pub ticker: String,
    pub name: String,
    pub rank: u32,
    pub price: f64,
}

/// Rebalance request against the caller's current book.
#[derive(Debug, Clone, Deserialize)]
pub struct RebalanceRequest {
    pub holdings: Vec<HoldingRow>,
    #[serde(default)]
    pub new_investment: f64,
    #[serde(default)]
    pub mode: Mode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HoldingRow {
    pub ticker: String,
    pub shares: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RebalanceResponse {
    pub sell: Vec<SellEntry>,
    pub buy: Vec<BuyEntry>,
    pub final_portfolio: Vec<PortfolioEntry>,
    pub summary: RebalanceSummary,
    pub max_drift: f64,
    pub drift_recommendation: Recommendation,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SellEntry {
    pub ticker: String,
    pub shares: u32,
    pub proceeds: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuyEntry {
    pub ticker: String,
    pub shares: u32,
    pub amount: f64,
    pub rank: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioEntry {
    pub ticker: String,
    pub shares: u32,
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RebalanceSummary {
    pub proceeds: f64,
    pub new_investment: f64,
    pub available_cash: f64,
    pub invested: f64,
    pub turnover: f64,
    pub costs: CostSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct CostSummary {
    pub fee: f64,
    pub spread: f64,
    pub total: f64,
    pub pct_of_turnover: f64,
}

impl From<CostBreakdown> for CostSummary {
    fn from(costs: CostBreakdown) -> Self {
        Self {
            fee: to_dollars(costs.fee_cents),
            spread: to_dollars(costs.spread_cents),
            total: to_dollars(costs.total_cents()),
            pct_of_turnover: costs.pct_of_turnover(),
        }
    }
}

/// Serve a plan request against a ranked universe.
///
/// The top `portfolio.size` ranked assets form the planner universe;
/// the following `portfolio.substitute_depth` assets are reported as
/// substitutes.
pub fn plan(
    assets: &[RankedAsset],
    config: &EngineConfig,
    request: &PlanRequest,
) -> Result<PlanResponse> {
    let excluded = parse_tickers(&request.excluded_tickers)?;
    let forced = parse_tickers(&request.forced_tickers)?;
    let budget_cents = (request.amount * 100.0).round() as i64;

    let mut ranked: Vec<RankedAsset> = assets.to_vec();
    ranked.sort_by_key(|a| (a.rank, a.ticker));
    let size = config.portfolio.size.min(ranked.len());
    let (universe, next_band) = ranked.split_at(size);

    let plan = allocation::plan(universe, budget_cents, &excluded, &forced)?;

    let names: FxHashMap<Ticker, &str> = universe
        .iter()
        .map(|a| (a.ticker, a.name.as_str()))
        .collect();

    let allocations = plan
        .lines
        .iter()
        .map(|line| AllocationEntry {
            ticker: line.ticker.to_string(),
            name: names.get(&line.ticker).copied().unwrap_or("").to_string(),
            rank: line.rank,
            shares: line.shares,
            price: to_dollars(line.price_cents),
            amount: to_dollars(line.amount_cents),
            target_weight: line.target_weight,
            actual_weight: line.actual_weight,
            deviation: line.deviation,
        })
        .collect();

    let substitutes = next_band
        .iter()
        .take(config.portfolio.substitute_depth)
        .map(|a| SubstituteEntry {
            ticker: a.ticker.to_string(),
            name: a.name.clone(),
            rank: a.rank,
            price: to_dollars(a.price_base_cents),
        })
        .collect();

    Ok(PlanResponse {
        allocations,
        summary: PlanSummary {
            total_invested: to_dollars(plan.invested_cents()),
            cash_remaining: to_dollars(plan.cash_remaining_cents),
            utilization: plan.utilization,
            max_deviation: plan.max_deviation,
        },
        warnings: plan.warnings.iter().map(|w| w.to_string()).collect(),
        optimal_amounts: plan
            .optimal_amounts
            .iter()
            .map(|o| OptimalAmountEntry {
                amount: to_dollars(o.budget_cents),
                max_deviation: o.max_deviation,
            })
            .collect(),
        substitutes,
    })
}

/// Serve a rebalance request against a ranked universe.
///
/// The request carries no prices for tickers that dropped out of the
/// ranking; those holdings are valued at zero cost basis and flagged
/// with a `missing_quote` warning.
pub fn rebalance(
    assets: &[RankedAsset],
    config: &EngineConfig,
    request: &RebalanceRequest,
) -> Result<RebalanceResponse> {
    let holdings: Vec<Holding> = request
        .holdings
        .iter()
        .map(|row| {
            check_ticker(&row.ticker).map_err(Error::Holdings)?;
            Ok(Holding {
                ticker: Ticker::new(&row.ticker),
                shares: row.shares,
                cost_basis_cents: 0,
            })
        })
        .collect::<Result<_>>()?;

    let new_capital_cents = (request.new_investment * 100.0).round() as i64;
    rebalance_holdings(assets, config, &holdings, new_capital_cents, request.mode)
}

/// Rebalance against holdings the caller already converted to engine
/// types (the CLI path, where cost basis is available as a valuation
/// fallback for dropped tickers).
pub fn rebalance_holdings(
    assets: &[RankedAsset],
    config: &EngineConfig,
    holdings: &[Holding],
    new_capital_cents: i64,
    mode: Mode,
) -> Result<RebalanceResponse> {
    let plan = rebalance::rebalance(
        holdings,
        assets,
        &[],
        new_capital_cents,
        mode,
        config.rank_bands(),
        &config.cost_params(),
    )?;

    let sell = plan
        .sells
        .iter()
        .map(|s| SellEntry {
            ticker: s.ticker.to_string(),
            shares: s.shares,
            proceeds: to_dollars(s.proceeds_cents),
            reason: s.reason.to_string(),
        })
        .collect();

    let buy = plan
        .buys
        .iter()
        .map(|b| BuyEntry {
            ticker: b.ticker.to_string(),
            shares: b.shares,
            amount: to_dollars(b.amount_cents),
            rank: b.rank,
            reason: b.reason.to_string(),
        })
        .collect();

    let final_portfolio = plan
        .final_portfolio()
        .iter()
        .map(|l| PortfolioEntry {
            ticker: l.ticker.to_string(),
            shares: l.shares,
            rank: l.rank,
        })
        .collect();

    Ok(RebalanceResponse {
        sell,
        buy,
        final_portfolio,
        summary: RebalanceSummary {
            proceeds: to_dollars(plan.proceeds_cents()),
            new_investment: to_dollars(new_capital_cents),
            available_cash: to_dollars(plan.available_cash_cents),
            invested: to_dollars(plan.buy_total_cents()),
            turnover: to_dollars(plan.turnover_cents),
            costs: plan.costs.into(),
        },
        max_drift: plan.max_drift,
        drift_recommendation: plan.recommendation,
        warnings: plan.warnings.iter().map(|w| w.to_string()).collect(),
    })
}

fn parse_tickers(list: &[String]) -> Result<FxHashSet<Ticker>> {
    list.iter()
        .map(|s| {
            check_ticker(s).map_err(Error::Universe)?;
            Ok(Ticker::new(s))
        })
        .collect()
}

fn check_ticker(s: &str) -> std::result::Result<(), String> {
    if s.is_empty() || s.len() > Ticker::MAX_LEN || !s.is_ascii() {
        return Err(format!("ticker '{s}' must be 1..=8 ASCII bytes"));
    }
    Ok(())
}

fn to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}
