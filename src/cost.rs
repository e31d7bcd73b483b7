//! Transaction cost estimation for rebalance turnover.

use serde::{Deserialize, Serialize};

/// Brokerage cost parameters.
///
/// `fee_rate` is the proportional commission on turnover, subject to a
/// per-trade minimum; `spread_rate` models the half-spread paid crossing
/// the book. Defaults match a 0.069% commission with a $1 floor and a
/// 0.3% spread estimate.
///
/// ```
/// use rankfolio::cost::CostParams;
///
/// let params = CostParams::default();
/// let costs = params.estimate(100_000_00, 5);
/// assert_eq!(costs.fee_cents, 69_00);
/// assert_eq!(costs.spread_cents, 300_00);
/// assert_eq!(costs.total_cents(), 369_00);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostParams {
    /// Commission as a fraction of turnover (e.g. 0.00069 = 0.069%).
    pub fee_rate: f64,
    /// Minimum commission per trade (cents).
    pub fee_floor_cents: i64,
    /// Spread estimate as a fraction of turnover (e.g. 0.003 = 0.3%).
    pub spread_rate: f64,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            fee_rate: 0.00069,
            fee_floor_cents: 1_00,
            spread_rate: 0.003,
        }
    }
}

impl CostParams {
    /// A zero-cost model (no fees, no spread).
    pub fn zero() -> Self {
        Self {
            fee_rate: 0.0,
            fee_floor_cents: 0,
            spread_rate: 0.0,
        }
    }

    /// Estimate costs for a rebalance with the given total turnover
    /// (buys + sells, cents) and number of trades.
    ///
    /// Pure: negative turnover is a programming error (debug-asserted)
    /// and clamps to zero.
    pub fn estimate(&self, turnover_cents: i64, trade_count: usize) -> CostBreakdown {
        debug_assert!(turnover_cents >= 0, "turnover must be >= 0, got {turnover_cents}");
        let turnover = turnover_cents.max(0);

        let rate_fee = (turnover as f64 * self.fee_rate).round() as i64;
        let floor_fee = self.fee_floor_cents.saturating_mul(trade_count as i64);
        let fee_cents = rate_fee.max(floor_fee);
        let spread_cents = (turnover as f64 * self.spread_rate).round() as i64;

        CostBreakdown {
            turnover_cents: turnover,
            fee_cents,
            spread_cents,
        }
    }
}

/// Estimated execution costs for one rebalance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CostBreakdown {
    pub turnover_cents: i64,
    pub fee_cents: i64,
    pub spread_cents: i64,
}

impl CostBreakdown {
    /// Total estimated cost (cents).
    pub fn total_cents(&self) -> i64 {
        self.fee_cents + self.spread_cents
    }

    /// Total cost as a fraction of turnover; 0 when turnover is 0.
    pub fn pct_of_turnover(&self) -> f64 {
        if self.turnover_cents == 0 {
            0.0
        } else {
            self.total_cents() as f64 / self.turnover_cents as f64
        }
    }
}

impl std::fmt::Display for CostBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "${:.2} fee + ${:.2} spread = ${:.2} ({:.3}% of turnover)",
            self.fee_cents as f64 / 100.0,
            self.spread_cents as f64 / 100.0,
            self.total_cents() as f64 / 100.0,
            self.pct_of_turnover() * 100.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rates_on_100k_turnover() {
        // $100,000 turnover, 5 trades: fee 0.069% = $69, spread 0.3% = $300
        let costs = CostParams::default().estimate(100_000_00, 5);
        assert_eq!(costs.fee_cents, 69_00);
        assert_eq!(costs.spread_cents, 300_00);
        assert_eq!(costs.total_cents(), 369_00);
        assert!((costs.pct_of_turnover() - 0.00369).abs() < 1e-12);
    }

    #[test]
    fn floor_binds_on_small_turnover() {
        // $50 turnover, 3 trades: rate fee rounds to 3 cents, floor is $3
        let costs = CostParams::default().estimate(50_00, 3);
        assert_eq!(costs.fee_cents, 3_00);
    }

    #[test]
    fn zero_turnover_is_free() {
        let costs = CostParams::default().estimate(0, 0);
        assert_eq!(costs.total_cents(), 0);
        assert_eq!(costs.pct_of_turnover(), 0.0);
    }

    #[test]
    fn zero_trades_skip_floor() {
        let costs = CostParams::default().estimate(10_000_00, 0);
        assert_eq!(costs.fee_cents, (10_000_00 as f64 * 0.00069).round() as i64);
    }

    #[test]
    fn zero_model_is_free() {
        let costs = CostParams::zero().estimate(1_000_000_00, 10);
        assert_eq!(costs.total_cents(), 0);
    }

    #[test]
    fn display_formats_dollars() {
        let costs = CostParams::default().estimate(100_000_00, 5);
        assert_eq!(
            costs.to_string(),
            "$69.00 fee + $300.00 spread = $369.00 (0.369% of turnover)"
        );
    }
}
