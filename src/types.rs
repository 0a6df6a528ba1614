//! Shared types for GEFLIP.
//!
//! These types form the data model used across all modules: item metadata
//! and price snapshots as delivered by the market API, the joined per-item
//! record the strategy works on, and the derived suggestions we print.
//! Everything here is an immutable snapshot for the duration of one run.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gold pieces. Every price, cost, and profit is a whole number of gp.
pub type Gp = i64;

// ---------------------------------------------------------------------------
// Market data
// ---------------------------------------------------------------------------

/// Item metadata from the mapping endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub name: String,
    /// Maximum quantity purchasable per 4-hour window. Unknown for some items.
    pub buy_limit: Option<i64>,
    pub members: Option<bool>,
}

/// Latest instant-trade prices for one item.
///
/// `low` is the most recent instant-sell price (what a patient buyer pays),
/// `high` the most recent instant-buy price (what a patient seller receives).
/// Timestamps are unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceQuote {
    pub high: Option<Gp>,
    pub high_time: Option<i64>,
    pub low: Option<Gp>,
    pub low_time: Option<i64>,
}

/// Trailing one-hour averages and traded volume for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VolumeWindow {
    pub avg_high_price: Option<Gp>,
    pub high_price_volume: i64,
    pub avg_low_price: Option<Gp>,
    pub low_price_volume: i64,
}

/// One item with all three datasets joined by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketRecord {
    pub item: Item,
    pub quote: PriceQuote,
    pub volume: VolumeWindow,
}

// ---------------------------------------------------------------------------
// Suggestion
// ---------------------------------------------------------------------------

/// A ranked flip candidate: buy `quantity` at `buy_price`, sell at
/// `sell_price`.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub item_id: u32,
    pub item_name: String,
    pub buy_limit: Option<i64>,
    /// Buy limit left in the current window, when a ledger is in use.
    pub remaining_limit: Option<i64>,
    pub buy_price: Gp,
    pub sell_price: Gp,
    pub quantity: i64,
    pub cost: Gp,
    pub gross_sell: Gp,
    pub tax: Gp,
    pub net_profit: Gp,
    pub unit_profit: Gp,
    /// `net_profit / cost`.
    pub roi: Decimal,
    pub hourly_volume: i64,
    pub buy_volume: i64,
    pub sell_volume: i64,
    /// Hours to fill the buy leg at the observed buy-side volume.
    pub buy_fill_hours: Decimal,
    pub sell_fill_hours: Decimal,
    /// Expected hours to fill both legs back to back.
    pub fill_hours: Decimal,
    pub profit_per_hour: Decimal,
    /// Official guide price, display only. `None` if not requested or
    /// unavailable.
    pub guide_price: Option<Gp>,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): buy x{} @ {} → sell @ {} | profit {} gp | ROI {:.2}%",
            self.item_name,
            self.item_id,
            self.quantity,
            self.buy_price,
            self.sell_price,
            self.net_profit,
            self.roi * Decimal::ONE_HUNDRED,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for GEFLIP.
#[derive(Debug, thiserror::Error)]
pub enum FlipError {
    #[error("Network error ({endpoint}): {message}")]
    Network { endpoint: String, message: String },

    #[error("Unexpected response ({endpoint}): {message}")]
    Decode { endpoint: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Limit ledger error: {0}")]
    Ledger(String),
}

impl FlipError {
    pub fn network(endpoint: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub fn decode(endpoint: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
