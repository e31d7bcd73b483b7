// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! Property-based tests for allocation and rebalancing invariants.
//!
//! These tests use proptest to verify that the engine's key invariants
//! hold across randomly generated universes, budgets, and books.

use proptest::prelude::*;
use rankfolio::allocation;
use rankfolio::cost::CostParams;
use rankfolio::rebalance::{self, Mode, RankBands};
use rankfolio::types::{Holding, RankedAsset, Ticker};
use rustc_hash::FxHashSet;

/// Generate a valid price in cents (one cent to $2,000).
fn price_strategy() -> impl Strategy<Value = i64> {
    1i64..=2_000_00
}

/// Generate a budget in cents (one cent to $100,000).
fn budget_strategy() -> impl Strategy<Value = i64> {
    1i64..=100_000_00
}

/// Generate a ranked universe of 1..max assets with random prices.
fn universe_strategy(max: usize) -> impl Strategy<Value = Vec<RankedAsset>> {
    prop::collection::vec(price_strategy(), 1..max).prop_map(|prices| {
        prices
            .into_iter()
            .enumerate()
            .map(|(i, price)| {
                let n = i as u32 + 1;
                RankedAsset::new(&format!("T{n}"), &format!("Asset {n}"), n, price)
            })
            .collect()
    })
}

fn none() -> FxHashSet<Ticker> {
    FxHashSet::default()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // ========================================================================
    // CONSERVATION INVARIANTS
    // ========================================================================

    /// Invested amount plus remaining cash equals the budget, exactly.
    #[test]
    fn capital_is_conserved(
        universe in universe_strategy(30),
        budget in budget_strategy(),
    ) {
        let plan = allocation::plan(&universe, budget, &none(), &none()).unwrap();
        prop_assert_eq!(
            plan.invested_cents() + plan.cash_remaining_cents,
            plan.budget_cents,
            "conservation violated: invested={} + cash={} != budget={}",
            plan.invested_cents(), plan.cash_remaining_cents, plan.budget_cents
        );
    }

    /// Without forced tickers the plan never overspends.
    #[test]
    fn budget_is_never_exceeded(
        universe in universe_strategy(30),
        budget in budget_strategy(),
    ) {
        let plan = allocation::plan(&universe, budget, &none(), &none()).unwrap();
        prop_assert!(plan.cash_remaining_cents >= 0);
        prop_assert!(plan.utilization <= 1.0 + 1e-12);
    }

    /// Every line's amount is its share count times its price.
    #[test]
    fn amounts_match_shares_times_price(
        universe in universe_strategy(30),
        budget in budget_strategy(),
    ) {
        let plan = allocation::plan(&universe, budget, &none(), &none()).unwrap();
        for line in &plan.lines {
            prop_assert_eq!(line.amount_cents, i64::from(line.shares) * line.price_cents);
            prop_assert!(line.amount_cents >= 0);
        }
    }

    /// Planning is a pure function: same inputs, same plan.
    #[test]
    fn planning_is_idempotent(
        universe in universe_strategy(20),
        budget in budget_strategy(),
    ) {
        let a = allocation::plan(&universe, budget, &none(), &none()).unwrap();
        let b = allocation::plan(&universe, budget, &none(), &none()).unwrap();
        prop_assert_eq!(a, b);
    }

    // ========================================================================
    // REBALANCE INVARIANTS
    // ========================================================================

    /// Active holdings partition into sells and holds; buys never
    /// overlap either bucket.
    #[test]
    fn book_partitions_into_sells_and_holds(
        universe in universe_strategy(30),
        shares in prop::collection::vec(0u32..50, 0..10),
        capital in 0i64..10_000_00,
    ) {
        // Holding tickers reuse the universe naming, so any index past
        // the universe length is a dropped ticker.
        let holdings: Vec<Holding> = shares
            .iter()
            .enumerate()
            .map(|(i, &s)| Holding::new(&format!("T{}", i + 1), s, 100_00))
            .collect();

        let plan = rebalance::rebalance(
            &holdings,
            &universe,
            &[],
            capital,
            Mode::Full,
            RankBands::default(),
            &CostParams::default(),
        )
        .unwrap();

        let active = holdings.iter().filter(|h| h.shares > 0).count();
        prop_assert_eq!(plan.sells.len() + plan.holds.len(), active);

        for buy in &plan.buys {
            prop_assert!(plan.sells.iter().all(|s| s.ticker != buy.ticker));
            prop_assert!(plan.holds.iter().all(|h| h.ticker != buy.ticker));
        }
    }

    /// Add-only mode never liquidates and never spends sell proceeds.
    #[test]
    fn add_only_never_sells(
        universe in universe_strategy(30),
        shares in prop::collection::vec(0u32..50, 0..10),
        capital in 0i64..10_000_00,
    ) {
        let holdings: Vec<Holding> = shares
            .iter()
            .enumerate()
            .map(|(i, &s)| Holding::new(&format!("T{}", i + 1), s, 100_00))
            .collect();

        let plan = rebalance::rebalance(
            &holdings,
            &universe,
            &[],
            capital,
            Mode::AddOnly,
            RankBands::default(),
            &CostParams::default(),
        )
        .unwrap();

        prop_assert!(plan.sells.is_empty());
        prop_assert_eq!(plan.available_cash_cents, capital);
        prop_assert!(plan.buy_total_cents() <= capital);
    }

    // ========================================================================
    // COST ESTIMATOR
    // ========================================================================

    /// Costs are non-negative and total consistently.
    #[test]
    fn costs_are_consistent(
        turnover in 0i64..1_000_000_00,
        trades in 0usize..50,
    ) {
        let costs = CostParams::default().estimate(turnover, trades);
        prop_assert!(costs.fee_cents >= 0);
        prop_assert!(costs.spread_cents >= 0);
        prop_assert_eq!(costs.total_cents(), costs.fee_cents + costs.spread_cents);
        prop_assert!(costs.pct_of_turnover() >= 0.0);
    }
}
