//! Rank-band rebalancing: sell/hold/buy decisions with hysteresis.
//!
//! A held ticker is sold only when it leaves the wider sell band
//! (`rank > sell_rank_threshold`) or drops out of the universe entirely;
//! slipping out of the narrower buy band alone never triggers a sale.
//! This asymmetry is deliberate: it keeps turnover (and cost) down when
//! ranks wobble. Buys come from the top of the ranking and are sized by
//! the equal-weight allocation planner.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize, Serializer};

use crate::allocation;
use crate::cost::{CostBreakdown, CostParams};
use crate::error::{Error, Result, Warning};
use crate::types::{Holding, RankedAsset, Ticker};

/// Rank thresholds for the buy and sell bands.
///
/// `buy_rank_threshold < rank <= sell_rank_threshold` is the hysteresis
/// band: good enough to keep, not good enough to enter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankBands {
    pub buy_rank_threshold: u32,
    pub sell_rank_threshold: u32,
}

impl Default for RankBands {
    fn default() -> Self {
        Self {
            buy_rank_threshold: 10,
            sell_rank_threshold: 20,
        }
    }
}

impl RankBands {
    pub fn validate(&self) -> Result<()> {
        if self.buy_rank_threshold == 0 {
            return Err(Error::Config("buy_rank_threshold must be >= 1".into()));
        }
        if self.buy_rank_threshold > self.sell_rank_threshold {
            return Err(Error::Config(format!(
                "buy_rank_threshold ({}) must not exceed sell_rank_threshold ({})",
                self.buy_rank_threshold, self.sell_rank_threshold
            )));
        }
        Ok(())
    }
}

/// Rebalance mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Sell out-of-band positions and redeploy proceeds plus new capital.
    #[default]
    Full,
    /// Never liquidate; fund buys from new capital only.
    AddOnly,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Full => write!(f, "FULL"),
            Mode::AddOnly => write!(f, "ADD_ONLY"),
        }
    }
}

/// Why a position is being sold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SellReason {
    /// Ticker no longer appears in the ranking at all.
    NotInUniverse,
    /// Ticker slipped below the sell band.
    RankDropped(u32),
}

impl fmt::Display for SellReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SellReason::NotInUniverse => write!(f, "not_in_universe"),
            SellReason::RankDropped(rank) => write!(f, "rank_dropped:{rank}"),
        }
    }
}

impl Serialize for SellReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Why a position is being bought.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuyReason {
    /// Ticker entered the buy band and is not currently held.
    EnteredBuyBand(u32),
}

impl fmt::Display for BuyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuyReason::EnteredBuyBand(rank) => write!(f, "entered_buy_band:{rank}"),
        }
    }
}

impl Serialize for BuyReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Terminal classification for one ticker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Sell(SellReason),
    Hold,
    Buy,
    /// Not held and not in the buy band: nothing to do.
    Skip,
}

/// Classify a single ticker against the current book and ranking.
///
/// Pure; decided independently per ticker. Held tickers classify as
/// `Sell` or `Hold`, unheld tickers as `Buy` or `Skip`.
pub fn classify(
    ticker: Ticker,
    holdings: &FxHashMap<Ticker, u32>,
    ranking: &FxHashMap<Ticker, u32>,
    bands: RankBands,
) -> Decision {
    let held = holdings.get(&ticker).copied().unwrap_or(0) > 0;
    let rank = ranking.get(&ticker).copied();
    match (held, rank) {
        (true, None) => Decision::Sell(SellReason::NotInUniverse),
        (true, Some(r)) if r > bands.sell_rank_threshold => {
            Decision::Sell(SellReason::RankDropped(r))
        }
        (true, Some(_)) => Decision::Hold,
        (false, Some(r)) if r <= bands.buy_rank_threshold => Decision::Buy,
        (false, _) => Decision::Skip,
    }
}

/// A position to liquidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SellLine {
    pub ticker: Ticker,
    pub shares: u32,
    pub proceeds_cents: i64,
    pub reason: SellReason,
}

/// A position to keep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HoldLine {
    pub ticker: Ticker,
    pub shares: u32,
    /// Current rank; `None` when the ticker dropped out of the ranking
    /// but sells are suppressed (`ADD_ONLY`).
    pub rank: Option<u32>,
}

/// A position to open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BuyLine {
    pub ticker: Ticker,
    pub shares: u32,
    pub amount_cents: i64,
    pub rank: u32,
    pub reason: BuyReason,
}

/// One line of the post-trade book.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PortfolioLine {
    pub ticker: Ticker,
    pub shares: u32,
    pub rank: Option<u32>,
}

/// How urgently the book needs rebalancing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Low,
    Medium,
    High,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Low => write!(f, "low"),
            Recommendation::Medium => write!(f, "medium"),
            Recommendation::High => write!(f, "high"),
        }
    }
}

/// A complete rebalance proposal.
///
/// Every held ticker (after zero-share filtering) appears in exactly one
/// of `sells`/`holds`; `buys` never overlaps either.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RebalancePlan {
    pub mode: Mode,
    pub sells: Vec<SellLine>,
    pub holds: Vec<HoldLine>,
    pub buys: Vec<BuyLine>,
    /// Cash available to the buy sizing: proceeds + new capital in
    /// `FULL`, new capital alone in `ADD_ONLY`.
    pub available_cash_cents: i64,
    /// Sell proceeds plus buy notional.
    pub turnover_cents: i64,
    pub costs: CostBreakdown,
    /// Largest pre-trade deviation from equal weight across the book.
    pub max_drift: f64,
    pub recommendation: Recommendation,
    pub warnings: Vec<Warning>,
}

impl RebalancePlan {
    /// Total sell proceeds (cents).
    pub fn proceeds_cents(&self) -> i64 {
        self.sells.iter().map(|s| s.proceeds_cents).sum()
    }

    /// Total buy notional (cents).
    pub fn buy_total_cents(&self) -> i64 {
        self.buys.iter().map(|b| b.amount_cents).sum()
    }

    /// The proposed post-trade book: holds plus buys, best rank first
    /// (unranked holds last).
    pub fn final_portfolio(&self) -> Vec<PortfolioLine> {
        let mut book: Vec<PortfolioLine> = self
            .holds
            .iter()
            .map(|h| PortfolioLine {
                ticker: h.ticker,
                shares: h.shares,
                rank: h.rank,
            })
            .chain(self.buys.iter().map(|b| PortfolioLine {
                ticker: b.ticker,
                shares: b.shares,
                rank: Some(b.rank),
            }))
            .collect();
        book.sort_by_key(|l| (l.rank.unwrap_or(u32::MAX), l.ticker));
        book
    }
}

/// Compute a rebalance plan for an existing book against a fresh ranking.
///
/// `quotes` supplies prices for held tickers that are absent from the
/// ranking; when neither source has a price, the holding's cost basis is
/// used and a [`Warning::MissingQuote`] recorded. Holdings with zero
/// shares are ignored. The ranking must be free of duplicate tickers and
/// duplicate rank values — either is a fatal [`Error::DuplicateRank`].
pub fn rebalance(
    holdings: &[Holding],
    ranking: &[RankedAsset],
    quotes: &[(Ticker, i64)],
    new_capital_cents: i64,
    mode: Mode,
    bands: RankBands,
    costs: &CostParams,
) -> Result<RebalancePlan> {
    if new_capital_cents < 0 {
        return Err(Error::InvalidCapital(new_capital_cents));
    }
    bands.validate()?;
    validate_ranking(ranking)?;

    let active: Vec<&Holding> = holdings.iter().filter(|h| h.shares > 0).collect();
    let mut seen = FxHashSet::default();
    for h in &active {
        if !seen.insert(h.ticker) {
            return Err(Error::Holdings(format!("duplicate holding: {}", h.ticker)));
        }
    }

    let rank_map: FxHashMap<Ticker, u32> = ranking.iter().map(|a| (a.ticker, a.rank)).collect();
    let price_map: FxHashMap<Ticker, i64> = ranking
        .iter()
        .map(|a| (a.ticker, a.price_base_cents))
        .collect();
    let quote_map: FxHashMap<Ticker, i64> = quotes.iter().copied().collect();
    let held_map: FxHashMap<Ticker, u32> = active.iter().map(|h| (h.ticker, h.shares)).collect();

    let mut warnings = Vec::new();

    // Resolve one valuation price per holding up front: ranking first,
    // then supplemental quotes, then cost basis (with a warning).
    let mut holding_prices: FxHashMap<Ticker, i64> = FxHashMap::default();
    for h in &active {
        let price = match (price_map.get(&h.ticker), quote_map.get(&h.ticker)) {
            (Some(&p), _) if p > 0 => p,
            (_, Some(&q)) if q > 0 => q,
            _ => {
                warnings.push(Warning::MissingQuote(h.ticker));
                h.cost_basis_cents
            }
        };
        holding_prices.insert(h.ticker, price);
    }

    let mut sells = Vec::new();
    let mut holds = Vec::new();
    for h in &active {
        match classify(h.ticker, &held_map, &rank_map, bands) {
            Decision::Sell(reason) if mode == Mode::Full => {
                let price = holding_prices.get(&h.ticker).copied().unwrap_or(0);
                sells.push(SellLine {
                    ticker: h.ticker,
                    shares: h.shares,
                    proceeds_cents: h.market_value(price),
                    reason,
                });
            }
            // ADD_ONLY suppresses liquidation: out-of-band positions stay.
            Decision::Sell(_) | Decision::Hold => holds.push(HoldLine {
                ticker: h.ticker,
                shares: h.shares,
                rank: rank_map.get(&h.ticker).copied(),
            }),
            other => debug_assert!(false, "held ticker classified {other:?}"),
        }
    }
    sells.sort_by_key(|s| s.ticker);
    holds.sort_by_key(|h| (h.rank.unwrap_or(u32::MAX), h.ticker));

    let proceeds: i64 = sells.iter().map(|s| s.proceeds_cents).sum();
    let available_cash_cents = match mode {
        Mode::Full => proceeds + new_capital_cents,
        Mode::AddOnly => new_capital_cents,
    };

    // Buy candidates: in the buy band and not already held, best rank
    // first. Sized by one equal-weight plan over the available cash.
    let mut buy_candidates: Vec<RankedAsset> = ranking
        .iter()
        .filter(|a| a.rank <= bands.buy_rank_threshold && !held_map.contains_key(&a.ticker))
        .cloned()
        .collect();
    buy_candidates.sort_by_key(|a| (a.rank, a.ticker));

    let mut buys = Vec::new();
    if available_cash_cents > 0 && !buy_candidates.is_empty() {
        let sizing = allocation::plan(
            &buy_candidates,
            available_cash_cents,
            &FxHashSet::default(),
            &FxHashSet::default(),
        )?;
        // EmptyUniverse from the sizing sub-plan would be misleading at
        // this level; per-asset price warnings still matter.
        warnings.extend(
            sizing
                .warnings
                .iter()
                .copied()
                .filter(|w| !matches!(w, Warning::EmptyUniverse)),
        );
        for line in &sizing.lines {
            if line.shares == 0 {
                continue;
            }
            buys.push(BuyLine {
                ticker: line.ticker,
                shares: line.shares,
                amount_cents: line.amount_cents,
                rank: line.rank,
                reason: BuyReason::EnteredBuyBand(line.rank),
            });
        }
    }

    let max_drift = max_drift(&active, &holding_prices);
    let recommendation = recommend(max_drift, !sells.is_empty());

    let buy_total: i64 = buys.iter().map(|b| b.amount_cents).sum();
    let turnover_cents = proceeds + buy_total;
    let costs = costs.estimate(turnover_cents, sells.len() + buys.len());

    Ok(RebalancePlan {
        mode,
        sells,
        holds,
        buys,
        available_cash_cents,
        turnover_cents,
        costs,
        max_drift,
        recommendation,
        warnings,
    })
}

/// Reject rankings where band membership would be ambiguous.
fn validate_ranking(ranking: &[RankedAsset]) -> Result<()> {
    let mut tickers = FxHashSet::default();
    let mut ranks = FxHashSet::default();
    for asset in ranking {
        if !tickers.insert(asset.ticker) {
            return Err(Error::DuplicateRank(format!("ticker {}", asset.ticker)));
        }
        if !ranks.insert(asset.rank) {
            return Err(Error::DuplicateRank(format!("rank {}", asset.rank)));
        }
    }
    Ok(())
}

/// Largest pre-trade deviation from equal weight across the book.
fn max_drift(active: &[&Holding], prices: &FxHashMap<Ticker, i64>) -> f64 {
    if active.is_empty() {
        return 0.0;
    }
    let value_of = |h: &Holding| h.market_value(prices.get(&h.ticker).copied().unwrap_or(0));
    let book_value: i64 = active.iter().map(|h| value_of(h)).sum();
    if book_value <= 0 {
        return 0.0;
    }
    let target = 1.0 / active.len() as f64;
    active
        .iter()
        .map(|h| (value_of(h) as f64 / book_value as f64 - target).abs())
        .fold(0.0, f64::max)
}

/// Fixed cutovers: drift under 10% is routine, 10-20% is worth a look,
/// anything above — or any pending sell — warrants action.
fn recommend(max_drift: f64, has_sells: bool) -> Recommendation {
    if has_sells || max_drift > 0.20 {
        Recommendation::High
    } else if max_drift >= 0.10 {
        Recommendation::Medium
    } else {
        Recommendation::Low
    }
}
