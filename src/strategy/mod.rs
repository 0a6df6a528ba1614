//! Strategy engine — price selection, profit sizing, filtering and ranking.

pub mod pricing;
pub mod profit;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::types::{Gp, MarketRecord, Suggestion};
use pricing::{choose_prices, is_fresh_enough, PricingConfig};
use profit::{evaluate, ProfitConfig};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds a candidate must clear, and how many to keep.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub min_roi: Decimal,
    /// Minimum net profit per unit in gp.
    pub min_unit_profit: Gp,
    pub min_hourly_volume: i64,
    pub top: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_roi: dec!(0.005),
            min_unit_profit: 100,
            min_hourly_volume: 500,
            top: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Selection report
// ---------------------------------------------------------------------------

/// Why candidates were dropped during one pass. Kept for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionReport {
    pub considered: usize,
    pub stale: usize,
    pub no_prices: usize,
    pub low_volume: usize,
    pub unfillable: usize,
    pub below_thresholds: usize,
    /// Candidates that cleared every filter, before truncation to top-N.
    pub qualified: usize,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Pipelines price selection → sizing → thresholds → ranking.
pub struct SuggestionEngine {
    pricing: PricingConfig,
    profit: ProfitConfig,
    filter: FilterConfig,
}

impl SuggestionEngine {
    pub fn new(pricing: PricingConfig, profit: ProfitConfig, filter: FilterConfig) -> Self {
        Self {
            pricing,
            profit,
            filter,
        }
    }

    /// Whether a priced candidate clears the ROI, unit-profit and volume
    /// thresholds.
    pub fn passes_thresholds(&self, s: &Suggestion) -> bool {
        s.hourly_volume >= self.filter.min_hourly_volume
            && s.roi >= self.filter.min_roi
            && s.unit_profit >= self.filter.min_unit_profit
    }

    /// Evaluate every record and return the top-N suggestions, best first.
    ///
    /// `remaining_limits` caps quantity per item when a buy-limit ledger is
    /// in use; items absent from the map are capped only by their buy limit.
    pub fn build_suggestions(
        &self,
        records: &[MarketRecord],
        remaining_limits: Option<&HashMap<u32, i64>>,
        now: DateTime<Utc>,
    ) -> (Vec<Suggestion>, SelectionReport) {
        let mut report = SelectionReport {
            considered: records.len(),
            ..Default::default()
        };
        let mut candidates = Vec::new();

        for record in records {
            let item = &record.item;

            if !is_fresh_enough(
                &record.quote,
                self.pricing.fresh_minutes,
                self.pricing.fresh_policy,
                now,
            ) {
                report.stale += 1;
                continue;
            }

            let Some(prices) = choose_prices(record, &self.pricing, now) else {
                report.no_prices += 1;
                continue;
            };

            // Both sides need real activity
            if prices.hourly_volume() < self.filter.min_hourly_volume.max(0) {
                report.low_volume += 1;
                continue;
            }

            let remaining = remaining_limits.and_then(|m| m.get(&item.id).copied());
            let Some(position) = evaluate(&prices, item.buy_limit, remaining, &self.profit) else {
                report.unfillable += 1;
                continue;
            };

            let suggestion = Suggestion {
                item_id: item.id,
                item_name: item.name.clone(),
                buy_limit: item.buy_limit,
                remaining_limit: remaining,
                buy_price: position.buy_price,
                sell_price: position.sell_price,
                quantity: position.quantity,
                cost: position.cost,
                gross_sell: position.gross_sell,
                tax: position.tax,
                net_profit: position.net_profit,
                unit_profit: position.unit_profit,
                roi: position.roi,
                hourly_volume: prices.hourly_volume(),
                buy_volume: prices.buy_volume,
                sell_volume: prices.sell_volume,
                buy_fill_hours: position.buy_fill_hours,
                sell_fill_hours: position.sell_fill_hours,
                fill_hours: position.fill_hours,
                profit_per_hour: position.profit_per_hour,
                guide_price: None,
            };

            if !self.passes_thresholds(&suggestion) {
                debug!(
                    item_id = item.id,
                    unit_profit = suggestion.unit_profit,
                    roi = %suggestion.roi,
                    "Below thresholds"
                );
                report.below_thresholds += 1;
                continue;
            }

            candidates.push(suggestion);
        }

        report.qualified = candidates.len();
        let ranked = rank(candidates, self.filter.top);

        info!(
            considered = report.considered,
            stale = report.stale,
            no_prices = report.no_prices,
            low_volume = report.low_volume,
            unfillable = report.unfillable,
            below_thresholds = report.below_thresholds,
            qualified = report.qualified,
            returned = ranked.len(),
            "Suggestions built"
        );

        (ranked, report)
    }
}

/// Best first: net profit desc, then ROI desc, then item id asc.
fn compare(a: &Suggestion, b: &Suggestion) -> Ordering {
    b.net_profit
        .cmp(&a.net_profit)
        .then_with(|| b.roi.cmp(&a.roi))
        .then_with(|| a.item_id.cmp(&b.item_id))
}

/// Sort best first and keep at most `top`.
pub fn rank(mut suggestions: Vec<Suggestion>, top: usize) -> Vec<Suggestion> {
    suggestions.sort_by(compare);
    suggestions.truncate(top);
    suggestions
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
