//! Core types: Ticker, Currency, RankedAsset, Holding

use std::fmt;

use serde::{Serialize, Serializer};

/// A stock ticker stored inline as up to 8 ASCII bytes.
///
/// Inline storage keeps the type `Copy` and cheap to hash, so plans can
/// build `FxHashMap<Ticker, _>` lookups without allocation. Callers
/// validate length and charset at the input boundary (universe/holdings
/// loading); `new` itself only debug-asserts.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticker([u8; 8]);

impl Ticker {
    /// Maximum ticker length in bytes.
    pub const MAX_LEN: usize = 8;

    /// Create a ticker from a string. Bytes beyond [`Ticker::MAX_LEN`] are dropped.
    pub fn new(s: &str) -> Self {
        debug_assert!(
            !s.is_empty() && s.len() <= Self::MAX_LEN && s.is_ascii(),
            "ticker must be 1..=8 ASCII bytes, got {s:?}"
        );
        let mut buf = [0u8; Self::MAX_LEN];
        let n = s.len().min(Self::MAX_LEN);
        buf[..n].copy_from_slice(&s.as_bytes()[..n]);
        Ticker(buf)
    }

    /// The ticker as a string slice.
    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(Self::MAX_LEN);
        std::str::from_utf8(&self.0[..end]).unwrap_or("")
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticker({:?})", self.as_str())
    }
}

impl Serialize for Ticker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self.as_str())
    }
}

/// An ISO 4217 currency code stored inline as 3 ASCII bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Currency([u8; 3]);

impl Currency {
    pub const USD: Currency = Currency(*b"USD");

    /// Create a currency code. Input must be exactly 3 ASCII bytes
    /// (validated at the input boundary, debug-asserted here).
    pub fn new(s: &str) -> Self {
        debug_assert!(
            s.len() == 3 && s.is_ascii(),
            "currency must be 3 ASCII bytes, got {s:?}"
        );
        let mut buf = *b"???";
        let n = s.len().min(3);
        buf[..n].copy_from_slice(&s.as_bytes()[..n]);
        Currency(buf)
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::USD
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({:?})", self.as_str())
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self.as_str())
    }
}

/// One asset in a ranked universe snapshot.
///
/// Produced by the external ranking service; immutable for the duration of
/// one plan computation. `rank` is 1-based and dense within a snapshot.
/// Prices are fixed-point cents; all engine math uses `price_base_cents`
/// (the price converted to the portfolio's base currency), while
/// `price_cents`/`currency` carry the native quote for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedAsset {
    pub ticker: Ticker,
    pub name: String,
    pub rank: u32,
    /// Price in the asset's native currency (cents).
    pub price_cents: i64,
    pub currency: Currency,
    /// Price converted to the base currency (cents).
    pub price_base_cents: i64,
}

impl RankedAsset {
    /// Convenience constructor for a base-currency asset (native price == base price).
    pub fn new(ticker: &str, name: &str, rank: u32, price_cents: i64) -> Self {
        Self {
            ticker: Ticker::new(ticker),
            name: name.to_string(),
            rank,
            price_cents,
            currency: Currency::USD,
            price_base_cents: price_cents,
        }
    }
}

/// A currently held position, owned by the caller.
///
/// `shares` is unsigned: fractional and negative share counts are
/// unrepresentable (integer-lot venues). The engine never mutates
/// holdings — it only proposes deltas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Holding {
    pub ticker: Ticker,
    pub shares: u32,
    /// Average acquisition price (cents).
    pub cost_basis_cents: i64,
}

impl Holding {
    pub fn new(ticker: &str, shares: u32, cost_basis_cents: i64) -> Self {
        Self {
            ticker: Ticker::new(ticker),
            shares,
            cost_basis_cents,
        }
    }

    /// Market value of this holding at the given price (cents).
    pub fn market_value(&self, price_cents: i64) -> i64 {
        i64::from(self.shares) * price_cents
    }
}
