//! Equal-weight integer-share allocation planning.
//!
//! Turns a ranked universe and a cash budget into a concrete share count
//! per asset. Target weights are equal across the candidate set; integer
//! rounding is handled by flooring each asset's slice and reporting the
//! deviation, plus a bounded local search for nearby budgets that round
//! better (`optimal_amounts`).

use std::cmp::Ordering;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::error::{Error, Result, Warning};
use crate::types::{RankedAsset, Ticker};

/// Optimal-amount search scans ±`SEARCH_STEPS` multiples of
/// `budget / SEARCH_STEP_DIVISOR` around the requested budget
/// (±10% in 0.5% steps). Fixed and bounded: 40 trial plans per call.
const SEARCH_STEPS: i64 = 20;
const SEARCH_STEP_DIVISOR: i64 = 200;
/// At most this many improved budgets are reported.
const MAX_OPTIMAL_AMOUNTS: usize = 3;
/// A trial budget must beat the requested one by more than this.
const IMPROVEMENT_EPS: f64 = 1e-9;

/// One asset's slice of an allocation plan.
///
/// A line with `shares == 0` is a candidate that was too expensive for
/// its equal-weight slice; it stays in the plan so its deviation (the
/// full target weight) is visible, and its ticker is also listed in
/// [`AllocationPlan::excluded`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AllocationLine {
    pub ticker: Ticker,
    pub rank: u32,
    /// Price per share in base currency (cents).
    pub price_cents: i64,
    pub shares: u32,
    /// `shares * price_cents`.
    pub amount_cents: i64,
    pub target_weight: f64,
    pub actual_weight: f64,
    /// `actual_weight - target_weight`.
    pub deviation: f64,
}

/// A nearby budget that fits the equal-weight targets better.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptimalAmount {
    pub budget_cents: i64,
    pub max_deviation: f64,
}

/// A complete integer-share allocation for one budget.
///
/// Derived value: recompute whenever inputs change. The conservation
/// invariant `sum(amount_cents) + cash_remaining_cents == budget_cents`
/// holds exactly in integer arithmetic.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AllocationPlan {
    pub budget_cents: i64,
    pub lines: Vec<AllocationLine>,
    pub cash_remaining_cents: i64,
    /// Invested fraction of the budget.
    pub utilization: f64,
    /// Largest absolute weight deviation across plan lines.
    pub max_deviation: f64,
    /// Tickers that receive no allocation: caller-excluded, bad-price,
    /// or too expensive for their slice (sorted).
    pub excluded: Vec<Ticker>,
    /// Tickers that received a forced single share (sorted).
    pub forced: Vec<Ticker>,
    pub warnings: Vec<Warning>,
    /// Up to three nearby budgets with strictly lower max deviation,
    /// best first.
    pub optimal_amounts: Vec<OptimalAmount>,
}

impl AllocationPlan {
    /// Total invested amount (cents).
    pub fn invested_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.amount_cents).sum()
    }
}

/// Compute an equal-weight integer-share allocation.
///
/// `excluded` tickers are dropped from the candidate set before target
/// weights are computed. `forced` tickers receive exactly 1 share when
/// their price exceeds their equal-weight slice (instead of being
/// excluded). Assets with non-positive prices are dropped with a
/// warning, never failing the whole plan.
///
/// # Errors
///
/// [`Error::InvalidBudget`] when `budget_cents <= 0`.
///
/// ```
/// use rustc_hash::FxHashSet;
/// use rankfolio::allocation;
/// use rankfolio::types::RankedAsset;
///
/// let universe: Vec<RankedAsset> = (1u32..=10)
///     .map(|i| RankedAsset::new(&format!("S{i}"), &format!("Stock {i}"), i, 100_00))
///     .collect();
/// let none = FxHashSet::default();
/// let plan = allocation::plan(&universe, 1000_00, &none, &none).unwrap();
/// assert_eq!(plan.cash_remaining_cents, 0);
/// assert_eq!(plan.max_deviation, 0.0);
/// ```
pub fn plan(
    universe: &[RankedAsset],
    budget_cents: i64,
    excluded: &FxHashSet<Ticker>,
    forced: &FxHashSet<Ticker>,
) -> Result<AllocationPlan> {
    if budget_cents <= 0 {
        return Err(Error::InvalidBudget(budget_cents));
    }

    let mut plan = plan_at(universe, budget_cents, excluded, forced);
    plan.optimal_amounts =
        search_optimal_amounts(universe, budget_cents, excluded, forced, plan.max_deviation);
    Ok(plan)
}

/// One plan evaluation at a fixed budget. No optimal-amount search, so
/// the search itself can call this without recursing.
fn plan_at(
    universe: &[RankedAsset],
    budget_cents: i64,
    excluded: &FxHashSet<Ticker>,
    forced: &FxHashSet<Ticker>,
) -> AllocationPlan {
    let mut warnings = Vec::new();
    let mut excluded_out: Vec<Ticker> = Vec::new();
    let mut forced_out: Vec<Ticker> = Vec::new();

    let mut candidates: Vec<&RankedAsset> = Vec::with_capacity(universe.len());
    for asset in universe {
        if excluded.contains(&asset.ticker) {
            excluded_out.push(asset.ticker);
        } else if asset.price_base_cents <= 0 {
            warnings.push(Warning::InvalidPrice(asset.ticker));
            excluded_out.push(asset.ticker);
        } else {
            candidates.push(asset);
        }
    }
    candidates.sort_by_key(|a| (a.rank, a.ticker));

    let n = candidates.len();
    if n == 0 {
        warnings.push(Warning::EmptyUniverse);
        excluded_out.sort_unstable();
        return AllocationPlan {
            budget_cents,
            lines: Vec::new(),
            cash_remaining_cents: budget_cents,
            utilization: 0.0,
            max_deviation: 0.0,
            excluded: excluded_out,
            forced: Vec::new(),
            warnings,
            optimal_amounts: Vec::new(),
        };
    }

    let target_weight = 1.0 / n as f64;
    let ideal_cents = budget_cents / n as i64;

    let mut lines = Vec::with_capacity(n);
    for asset in &candidates {
        let price = asset.price_base_cents;
        let shares: u32 = if price > ideal_cents {
            // Cannot buy even one share within the equal-weight slice.
            if forced.contains(&asset.ticker) {
                forced_out.push(asset.ticker);
                1
            } else {
                excluded_out.push(asset.ticker);
                0
            }
        } else {
            u32::try_from(ideal_cents / price).unwrap_or(u32::MAX)
        };

        let amount_cents = i64::from(shares) * price;
        let actual_weight = amount_cents as f64 / budget_cents as f64;
        lines.push(AllocationLine {
            ticker: asset.ticker,
            rank: asset.rank,
            price_cents: price,
            shares,
            amount_cents,
            target_weight,
            actual_weight,
            deviation: actual_weight - target_weight,
        });
    }

    excluded_out.sort_unstable();
    forced_out.sort_unstable();

    let mut plan = AllocationPlan {
        budget_cents,
        lines,
        cash_remaining_cents: 0,
        utilization: 0.0,
        max_deviation: 0.0,
        excluded: excluded_out,
        forced: forced_out,
        warnings,
        optimal_amounts: Vec::new(),
    };
    refresh_totals(&mut plan);
    plan
}

/// Recompute cash, utilization and max deviation from the plan lines.
fn refresh_totals(plan: &mut AllocationPlan) {
    let invested = plan.invested_cents();
    plan.cash_remaining_cents = plan.budget_cents - invested;
    plan.utilization = if plan.budget_cents > 0 {
        invested as f64 / plan.budget_cents as f64
    } else {
        0.0
    };
    plan.max_deviation = plan
        .lines
        .iter()
        .map(|l| l.deviation.abs())
        .fold(0.0, f64::max);
}

/// Scan fixed-step budgets around the requested one and keep those whose
/// max deviation strictly improves on it, best first.
fn search_optimal_amounts(
    universe: &[RankedAsset],
    budget_cents: i64,
    excluded: &FxHashSet<Ticker>,
    forced: &FxHashSet<Ticker>,
    base_deviation: f64,
) -> Vec<OptimalAmount> {
    if base_deviation <= IMPROVEMENT_EPS {
        return Vec::new();
    }

    let step = (budget_cents / SEARCH_STEP_DIVISOR).max(1);
    let mut improved = Vec::new();
    for k in -SEARCH_STEPS..=SEARCH_STEPS {
        if k == 0 {
            continue;
        }
        let trial_budget = budget_cents + k * step;
        if trial_budget <= 0 {
            continue;
        }
        let trial = plan_at(universe, trial_budget, excluded, forced);
        if trial.max_deviation + IMPROVEMENT_EPS < base_deviation {
            improved.push(OptimalAmount {
                budget_cents: trial_budget,
                max_deviation: trial.max_deviation,
            });
        }
    }

    improved.sort_by(|a, b| {
        a.max_deviation
            .partial_cmp(&b.max_deviation)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                (a.budget_cents - budget_cents)
                    .abs()
                    .cmp(&(b.budget_cents - budget_cents).abs())
            })
            .then_with(|| a.budget_cents.cmp(&b.budget_cents))
    });
    improved.truncate(MAX_OPTIMAL_AMOUNTS);
    improved
}

/// Apply manual per-asset share adjustments as a pure transform over a
/// computed plan.
///
/// Only the touched lines and the plan totals are re-derived; the
/// optimizer is never re-run and `optimal_amounts` (computed for the
/// unadjusted plan) is left as advisory output. Share counts clamp at
/// zero. Tickers not present in the plan produce
/// [`Warning::UnknownAdjustment`].
pub fn apply_adjustments(
    plan: &AllocationPlan,
    deltas: &FxHashMap<Ticker, i64>,
) -> AllocationPlan {
    let mut adjusted = plan.clone();

    let known: FxHashSet<Ticker> = adjusted.lines.iter().map(|l| l.ticker).collect();
    let mut unknown: Vec<Ticker> = deltas
        .keys()
        .filter(|t| !known.contains(*t))
        .copied()
        .collect();
    unknown.sort_unstable();
    for ticker in unknown {
        adjusted.warnings.push(Warning::UnknownAdjustment(ticker));
    }

    for line in &mut adjusted.lines {
        if let Some(&delta) = deltas.get(&line.ticker) {
            let shares = (i64::from(line.shares) + delta).max(0);
            line.shares = u32::try_from(shares).unwrap_or(u32::MAX);
            line.amount_cents = i64::from(line.shares) * line.price_cents;
            line.actual_weight = line.amount_cents as f64 / adjusted.budget_cents as f64;
            line.deviation = line.actual_weight - line.target_weight;
        }
    }

    refresh_totals(&mut adjusted);
    adjusted
}
