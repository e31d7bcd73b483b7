// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! Allocation invariant tests: capital conservation, non-negativity,
//! forced inclusion, and the worked budget examples.

use rankfolio::allocation::{self, AllocationPlan};
use rankfolio::types::{RankedAsset, Ticker};
use rustc_hash::{FxHashMap, FxHashSet};

fn flat_universe(n: u32, price_cents: i64) -> Vec<RankedAsset> {
    (1..=n)
        .map(|i| RankedAsset::new(&format!("S{i}"), &format!("Stock {i}"), i, price_cents))
        .collect()
}

fn mixed_universe() -> Vec<RankedAsset> {
    vec![
        RankedAsset::new("AAPL", "Apple Inc.", 1, 185_00),
        RankedAsset::new("MSFT", "Microsoft", 2, 410_50),
        RankedAsset::new("NVDA", "NVIDIA", 3, 880_10),
        RankedAsset::new("KO", "Coca-Cola", 4, 61_37),
        RankedAsset::new("JNJ", "Johnson & Johnson", 5, 147_89),
        RankedAsset::new("XOM", "Exxon Mobil", 6, 113_24),
    ]
}

fn none() -> FxHashSet<Ticker> {
    FxHashSet::default()
}

fn assert_conserved(plan: &AllocationPlan) {
    assert_eq!(
        plan.invested_cents() + plan.cash_remaining_cents,
        plan.budget_cents,
        "capital not conserved: invested={} cash={} budget={}",
        plan.invested_cents(),
        plan.cash_remaining_cents,
        plan.budget_cents
    );
}

// === Capital conservation ===

#[test]
fn conservation_over_mixed_prices() {
    for budget in [1_00, 999_99, 10_000_00, 123_456_78, 1_000_000_00] {
        let plan = allocation::plan(&mixed_universe(), budget, &none(), &none()).unwrap();
        assert_conserved(&plan);
    }
}

#[test]
fn conservation_with_exclusions() {
    let excluded: FxHashSet<Ticker> =
        [Ticker::new("NVDA"), Ticker::new("XOM")].into_iter().collect();
    let plan = allocation::plan(&mixed_universe(), 25_000_00, &excluded, &none()).unwrap();
    assert_conserved(&plan);
    assert_eq!(plan.lines.len(), 4);
}

#[test]
fn conservation_survives_adjustments() {
    let base = allocation::plan(&mixed_universe(), 25_000_00, &none(), &none()).unwrap();
    let deltas: FxHashMap<Ticker, i64> = [
        (Ticker::new("AAPL"), 3),
        (Ticker::new("KO"), -2),
        (Ticker::new("MSFT"), -100),
    ]
    .into_iter()
    .collect();

    let adjusted = allocation::apply_adjustments(&base, &deltas);
    assert_conserved(&adjusted);
}

// === Worked examples ===

#[test]
fn even_budget_fills_every_slot() {
    // 10 assets at $100, budget $1,000: one share each, zero cash, zero deviation.
    let plan = allocation::plan(&flat_universe(10, 100_00), 1000_00, &none(), &none()).unwrap();
    assert!(plan.lines.iter().all(|l| l.shares == 1));
    assert_eq!(plan.cash_remaining_cents, 0);
    assert_eq!(plan.max_deviation, 0.0);
}

#[test]
fn short_budget_leaves_the_remainder_in_cash() {
    // Budget $950: the $95 slice cannot buy a $100 share anywhere.
    let plan = allocation::plan(&flat_universe(10, 100_00), 950_00, &none(), &none()).unwrap();
    assert!(plan.lines.iter().any(|l| l.shares == 0));
    assert_eq!(plan.cash_remaining_cents, 950_00);
    assert_conserved(&plan);
    // The optimizer should point at a nearby budget that does fit.
    assert!(!plan.optimal_amounts.is_empty());
    assert!(plan.optimal_amounts[0].max_deviation < plan.max_deviation);
}

#[test]
fn forced_inclusion_buys_exactly_one_share() {
    let mut universe = flat_universe(9, 50_00);
    universe.push(RankedAsset::new("BRK", "Berkshire", 10, 5_000_00));
    let forced: FxHashSet<Ticker> = [Ticker::new("BRK")].into_iter().collect();

    let plan = allocation::plan(&universe, 1000_00, &none(), &forced).unwrap();
    let brk = plan.lines.iter().find(|l| l.ticker == Ticker::new("BRK")).unwrap();
    assert_eq!(brk.shares, 1);
    assert_conserved(&plan);
}

// === Output shape ===

#[test]
fn shares_and_amounts_are_consistent() {
    let plan = allocation::plan(&mixed_universe(), 50_000_00, &none(), &none()).unwrap();
    for line in &plan.lines {
        assert_eq!(line.amount_cents, i64::from(line.shares) * line.price_cents);
        assert!(line.amount_cents >= 0);
    }
}

#[test]
fn utilization_bounded_without_forces() {
    let plan = allocation::plan(&mixed_universe(), 7_777_77, &none(), &none()).unwrap();
    assert!(plan.cash_remaining_cents >= 0);
    assert!(plan.utilization >= 0.0 && plan.utilization <= 1.0);
}

#[test]
fn identical_inputs_identical_output() {
    let universe = mixed_universe();
    let excluded: FxHashSet<Ticker> = [Ticker::new("KO")].into_iter().collect();
    let a = allocation::plan(&universe, 33_333_33, &excluded, &none()).unwrap();
    let b = allocation::plan(&universe, 33_333_33, &excluded, &none()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn optimal_amounts_stay_in_the_search_neighborhood() {
    let plan = allocation::plan(&flat_universe(10, 100_00), 950_00, &none(), &none()).unwrap();
    for opt in &plan.optimal_amounts {
        let distance = (opt.budget_cents - 950_00).abs();
        assert!(distance <= 95_00, "suggestion {} outside +/-10%", opt.budget_cents);
    }
}
