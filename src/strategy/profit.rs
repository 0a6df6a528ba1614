//! Buy-then-sell-all profit model.
//!
//! Sizes a position by budget, buy limit, and hourly liquidity, then
//! prices the round trip net of GE tax.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use tracing::trace;

use super::pricing::{adjust_for_aggressiveness, ChosenPrices};
use crate::types::Gp;

/// GE tax: 2% of sale proceeds.
pub const GE_TAX_RATE: Decimal = dec!(0.02);

/// Tax ceiling per item. Applied once to the whole sale of an item, not to
/// each unit.
pub const GE_TAX_CAP: Gp = 5_000_000;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ProfitConfig {
    /// Total gp available for this flip.
    pub budget: Gp,
    /// 0..=1; moves buy up and sell down to fill faster.
    pub aggressiveness: Decimal,
    /// Share of hourly volume we expect to fill without moving the price.
    pub liquidity_fraction: Decimal,
    /// Cap quantity at this many hours of observed volume.
    pub max_fill_hours: Decimal,
}

impl Default for ProfitConfig {
    fn default() -> Self {
        Self {
            budget: 0,
            aggressiveness: dec!(0.3),
            liquidity_fraction: dec!(0.25),
            max_fill_hours: dec!(1.5),
        }
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// A fully priced round trip for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub buy_price: Gp,
    pub sell_price: Gp,
    pub quantity: i64,
    pub cost: Gp,
    pub gross_sell: Gp,
    pub tax: Gp,
    pub net_profit: Gp,
    pub unit_profit: Gp,
    pub roi: Decimal,
    /// Hours to fill the buy leg at the observed buy-side volume.
    pub buy_fill_hours: Decimal,
    pub sell_fill_hours: Decimal,
    /// Both legs back to back.
    pub fill_hours: Decimal,
    pub profit_per_hour: Decimal,
}

/// `floor(fraction × volume)`, never negative. `None` when the product
/// doesn't fit, which leaves that constraint uncapped.
fn floor_share(fraction: Decimal, volume: i64) -> Option<i64> {
    let share = fraction.checked_mul(Decimal::from(volume))?.floor();
    share.to_i64().map(|n| n.max(0))
}

/// Tax on selling `quantity` units at `sell_price`:
/// `min(floor(2% × sell_price × quantity), 5,000,000)`.
pub fn ge_tax(sell_price: Gp, quantity: i64) -> Gp {
    let raw = GE_TAX_RATE
        .checked_mul(Decimal::from(sell_price))
        .and_then(|v| v.checked_mul(Decimal::from(quantity)))
        .and_then(|v| v.floor().to_i64())
        .unwrap_or(GE_TAX_CAP);
    raw.clamp(0, GE_TAX_CAP)
}

/// Largest quantity allowed by every constraint:
/// budget, buy limit, remaining limit, liquidity share of each side's
/// volume, and `max_fill_hours` of each side's volume.
pub fn max_quantity(
    buy_price: Gp,
    prices: &ChosenPrices,
    buy_limit: Option<i64>,
    remaining_limit: Option<i64>,
    config: &ProfitConfig,
) -> i64 {
    if buy_price <= 0 {
        return 0;
    }
    let liquidity = config.liquidity_fraction.clamp(Decimal::ZERO, Decimal::ONE);
    let fill_hours = config.max_fill_hours.max(Decimal::ZERO);

    [
        Some(config.budget / buy_price),
        buy_limit,
        remaining_limit,
        floor_share(liquidity, prices.buy_volume),
        floor_share(liquidity, prices.sell_volume),
        floor_share(fill_hours, prices.buy_volume),
        floor_share(fill_hours, prices.sell_volume),
    ]
    .into_iter()
    .flatten()
    .min()
    .unwrap_or(0)
    .max(0)
}

/// Price a round trip. `None` if nothing can be bought or the arithmetic
/// overflows.
pub fn evaluate(
    prices: &ChosenPrices,
    buy_limit: Option<i64>,
    remaining_limit: Option<i64>,
    config: &ProfitConfig,
) -> Option<Position> {
    let (buy_price, sell_price) =
        adjust_for_aggressiveness(prices.buy, prices.sell, config.aggressiveness);

    let quantity = max_quantity(buy_price, prices, buy_limit, remaining_limit, config);
    if quantity <= 0 {
        trace!(buy_price, "Quantity is zero");
        return None;
    }

    let cost = quantity.checked_mul(buy_price)?;
    if cost <= 0 {
        return None;
    }
    let gross_sell = quantity.checked_mul(sell_price)?;
    let tax = ge_tax(sell_price, quantity);
    let net_profit = gross_sell - tax - cost;
    let unit_profit = net_profit.div_euclid(quantity);
    let roi = Decimal::from(net_profit) / Decimal::from(cost);

    let q = Decimal::from(quantity);
    let buy_fill_hours = q / Decimal::from(prices.buy_volume.max(1));
    let sell_fill_hours = q / Decimal::from(prices.sell_volume.max(1));
    let fill_hours = buy_fill_hours + sell_fill_hours;
    let profit_per_hour = if fill_hours > Decimal::ZERO {
        Decimal::from(net_profit)
            .checked_div(fill_hours)
            .unwrap_or(Decimal::MAX)
    } else {
        Decimal::from(net_profit)
    };

    Some(Position {
        buy_price,
        sell_price,
        quantity,
        cost,
        gross_sell,
        tax,
        net_profit,
        unit_profit,
        roi,
        buy_fill_hours,
        sell_fill_hours,
        fill_hours,
        profit_per_hour,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
