//! Command-line interface.
//!
//! Flags map one-to-one onto the strategy configs. Everything is validated
//! before any network call; invalid input is a usage error (exit 2).

use clap::Parser;
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::report::{parse_gp_amount, ReportOptions};
use crate::strategy::pricing::{FreshPolicy, PriceSource, PricingConfig};
use crate::strategy::profit::ProfitConfig;
use crate::strategy::FilterConfig;
use crate::types::{FlipError, Gp};

fn parse_budget(s: &str) -> Result<Gp, String> {
    parse_gp_amount(s).map_err(|e| e.to_string())
}

/// Suggest profitable Grand Exchange flips using real-time prices and buy
/// limits.
#[derive(Debug, Parser)]
#[command(name = "geflip", version, about)]
pub struct Cli {
    /// Available gp to allocate (e.g. 900k, 1.5m, 2b)
    #[arg(
        long,
        value_parser = parse_budget,
        allow_hyphen_values = true,
        required_unless_present = "record_buy"
    )]
    pub budget: Option<Gp>,

    /// Number of suggestions to show
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Minimum ROI, e.g. 0.01 = 1%
    #[arg(long, default_value = "0.005", allow_negative_numbers = true)]
    pub min_roi: Decimal,

    /// Minimum profit per unit in gp
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    pub min_profit: Gp,

    /// 0..1; higher raises the buy price and lowers the sell price to fill faster
    #[arg(long, default_value = "0.3")]
    pub aggressiveness: Decimal,

    /// Fraction of hourly volume considered safe to fill within an hour
    #[arg(long, default_value = "0.25")]
    pub liquidity_frac: Decimal,

    /// Skip items whose hourly volume (thinner side) is below this
    #[arg(long, default_value_t = 500)]
    pub min_hourly_volume: i64,

    /// Cap quantity at this many hours of observed volume
    #[arg(long, default_value = "1.5")]
    pub max_fill_hours: Decimal,

    /// Price source: latest trades, 1h averages, or latest-when-fresh
    #[arg(long, value_enum, default_value_t = PriceSource::Latest)]
    pub price_source: PriceSource,

    /// Hybrid source: latest prices count as current under this many minutes
    #[arg(long, default_value = "20")]
    pub latest_max_age_min: Decimal,

    /// Skip items with no latest trade in the last N minutes (0 disables)
    #[arg(long, default_value = "0")]
    pub fresh_minutes: Decimal,

    /// Require any or both latest timestamps to be within --fresh-minutes
    #[arg(long, value_enum, default_value_t = FreshPolicy::Both)]
    pub fresh_policy: FreshPolicy,

    /// JSON ledger of recorded buys; caps quantity at the remaining 4h limit
    #[arg(long)]
    pub limits_file: Option<PathBuf>,

    /// Record a buy of QTY for ITEM_ID in the ledger and exit
    #[arg(long, num_args = 2, value_names = ["ITEM_ID", "QTY"], requires = "limits_file")]
    pub record_buy: Option<Vec<i64>>,

    /// Also fetch and show the official GE guide price (one request per row)
    #[arg(long)]
    pub with_ge: bool,

    /// Abbreviate gp values (k/m/b) instead of printing full integers
    #[arg(long)]
    pub abbreviate: bool,

    /// User-Agent for the prices API (default from the configured env var)
    #[arg(long)]
    pub ua: Option<String>,

    /// Path to a TOML config file (default: ./geflip.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Range checks clap can't express.
    pub fn validate(&self) -> Result<(), FlipError> {
        let invalid = |msg: &str| Err(FlipError::InvalidArgument(msg.to_string()));

        if let Some(args) = &self.record_buy {
            return match args.as_slice() {
                [id, qty] if u32::try_from(*id).is_ok() && *qty > 0 => Ok(()),
                _ => invalid("--record-buy needs a valid ITEM_ID and a positive QTY"),
            };
        }

        match self.budget {
            None => return invalid("--budget is required"),
            Some(b) if b < 1 => return invalid("--budget must be at least 1 gp"),
            _ => {}
        }
        if self.top < 1 {
            return invalid("--top must be at least 1");
        }
        if self.aggressiveness < Decimal::ZERO || self.aggressiveness > Decimal::ONE {
            return invalid("--aggressiveness must be between 0 and 1");
        }
        if self.liquidity_frac <= Decimal::ZERO || self.liquidity_frac > Decimal::ONE {
            return invalid("--liquidity-frac must be greater than 0 and at most 1");
        }
        if self.min_hourly_volume < 0 {
            return invalid("--min-hourly-volume must be non-negative");
        }
        if self.max_fill_hours <= Decimal::ZERO {
            return invalid("--max-fill-hours must be positive");
        }
        if self.latest_max_age_min < Decimal::ZERO || self.fresh_minutes < Decimal::ZERO {
            return invalid("--latest-max-age-min and --fresh-minutes must be non-negative");
        }
        Ok(())
    }

    /// `(item_id, qty)` when `--record-buy` was given and is valid.
    pub fn record_buy(&self) -> Option<(u32, i64)> {
        match self.record_buy.as_deref() {
            Some([id, qty]) => u32::try_from(*id).ok().map(|id| (id, *qty)),
            _ => None,
        }
    }

    pub fn pricing_config(&self) -> PricingConfig {
        PricingConfig {
            source: self.price_source,
            latest_max_age_mins: self.latest_max_age_min,
            fresh_minutes: self.fresh_minutes,
            fresh_policy: self.fresh_policy,
        }
    }

    pub fn profit_config(&self, budget: Gp) -> ProfitConfig {
        ProfitConfig {
            budget,
            aggressiveness: self.aggressiveness,
            liquidity_fraction: self.liquidity_frac,
            max_fill_hours: self.max_fill_hours,
        }
    }

    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            min_roi: self.min_roi,
            min_unit_profit: self.min_profit,
            min_hourly_volume: self.min_hourly_volume,
            top: self.top,
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            abbreviate: self.abbreviate,
            with_guide: self.with_ge,
        }
    }
}
