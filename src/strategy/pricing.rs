//! Price selection.
//!
//! Picks the buy/sell price pair for an item from the latest snapshot or
//! the hourly averages, applies the freshness filter, and shifts prices
//! toward each other to model faster fills.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use crate::types::{Gp, MarketRecord, PriceQuote};

/// Fraction of the spread each side moves at aggressiveness 1.0.
pub const SPREAD_SHIFT_FRACTION: Decimal = dec!(0.25);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which dataset supplies the buy/sell prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PriceSource {
    /// Latest instant-trade prices.
    #[default]
    Latest,
    /// One-hour average prices.
    #[value(name = "1h")]
    OneHour,
    /// Latest when both sides are recent enough, else one-hour averages.
    Hybrid,
}

/// How many sides of the latest quote must be recent to pass the
/// freshness filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FreshPolicy {
    Any,
    #[default]
    Both,
}

#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub source: PriceSource,
    /// Hybrid mode: latest prices count as current under this age.
    pub latest_max_age_mins: Decimal,
    /// Drop items whose latest trades are older than this. Zero disables.
    pub fresh_minutes: Decimal,
    pub fresh_policy: FreshPolicy,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            source: PriceSource::Latest,
            latest_max_age_mins: dec!(20),
            fresh_minutes: Decimal::ZERO,
            fresh_policy: FreshPolicy::Both,
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Prices and per-side hourly volumes chosen for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChosenPrices {
    pub buy: Gp,
    pub sell: Gp,
    /// Units traded at the low (buy-side) price in the last hour.
    pub buy_volume: i64,
    /// Units traded at the high (sell-side) price in the last hour.
    pub sell_volume: i64,
}

impl ChosenPrices {
    pub fn hourly_volume(&self) -> i64 {
        self.buy_volume.min(self.sell_volume)
    }
}

fn within(ts: Option<i64>, minutes: Decimal, now: DateTime<Utc>) -> bool {
    match ts {
        Some(t) => match minutes.checked_mul(dec!(60)) {
            Some(limit) => Decimal::from(now.timestamp().saturating_sub(t)) <= limit,
            // Window longer than anything representable
            None => true,
        },
        None => false,
    }
}

/// Freshness filter on the latest quote. Always passes when disabled.
pub fn is_fresh_enough(
    quote: &PriceQuote,
    fresh_minutes: Decimal,
    policy: FreshPolicy,
    now: DateTime<Utc>,
) -> bool {
    if fresh_minutes <= Decimal::ZERO {
        return true;
    }
    let high_ok = within(quote.high_time, fresh_minutes, now);
    let low_ok = within(quote.low_time, fresh_minutes, now);
    match policy {
        FreshPolicy::Any => high_ok || low_ok,
        FreshPolicy::Both => high_ok && low_ok,
    }
}

/// Choose buy/sell prices for a record according to the configured source.
///
/// Returns `None` when the chosen source lacks a positive price on either
/// side.
pub fn choose_prices(
    record: &MarketRecord,
    config: &PricingConfig,
    now: DateTime<Utc>,
) -> Option<ChosenPrices> {
    let quote = &record.quote;
    let window = &record.volume;

    let latest = (quote.low, quote.high);
    let hourly = (window.avg_low_price, window.avg_high_price);

    let (buy, sell) = match config.source {
        PriceSource::Latest => latest,
        PriceSource::OneHour => hourly,
        PriceSource::Hybrid => {
            let max_age = config.latest_max_age_mins;
            if within(quote.high_time, max_age, now) && within(quote.low_time, max_age, now) {
                latest
            } else {
                hourly
            }
        }
    };

    let buy = buy.filter(|p| *p > 0)?;
    let sell = sell.filter(|p| *p > 0)?;

    Some(ChosenPrices {
        buy,
        sell,
        buy_volume: window.low_price_volume,
        sell_volume: window.high_price_volume,
    })
}

/// Raise the buy price and lower the sell price by
/// `floor(spread × 0.25 × aggressiveness)` each.
///
/// Aggressiveness is clamped to 0..=1. Prices are returned unchanged when
/// there is no positive spread, or when the shift would close it.
pub fn adjust_for_aggressiveness(buy: Gp, sell: Gp, aggressiveness: Decimal) -> (Gp, Gp) {
    if buy <= 0 || sell <= 0 || sell <= buy {
        return (buy, sell);
    }
    let a = aggressiveness.clamp(Decimal::ZERO, Decimal::ONE);
    let spread = Decimal::from(sell - buy);
    let shift = (spread * SPREAD_SHIFT_FRACTION * a)
        .floor()
        .to_i64()
        .unwrap_or(0);

    let (adj_buy, adj_sell) = (buy + shift, sell - shift);
    if adj_sell <= adj_buy {
        return (buy, sell);
    }
    (adj_buy, adj_sell)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
