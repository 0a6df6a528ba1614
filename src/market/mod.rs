//! Market data sources.
//!
//! Defines the `MarketSource` and `GuidePriceSource` traits and provides
//! implementations for:
//! - OSRS Wiki real-time prices: item mapping, latest prices, 1-hour volumes
//! - Official GE catalogue: per-item guide price (display only)

pub mod catalogue;
pub mod wiki;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::types::{FlipError, Gp, Item, PriceQuote, VolumeWindow};

/// Abstraction over the bulk price API.
///
/// Each method is one HTTP call per run. Any failure is fatal to the run:
/// prices without volumes cannot be evaluated.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Item metadata (names, buy limits).
    async fn fetch_mapping(&self) -> Result<Vec<Item>, FlipError>;

    /// Latest instant-trade prices keyed by item id.
    async fn fetch_latest(&self) -> Result<HashMap<u32, PriceQuote>, FlipError>;

    /// Trailing one-hour averages and volumes keyed by item id.
    async fn fetch_one_hour(&self) -> Result<HashMap<u32, VolumeWindow>, FlipError>;
}

/// Abstraction over the per-item guide price lookup.
///
/// `Ok(None)` means the endpoint answered but had no usable price.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GuidePriceSource: Send + Sync {
    async fn fetch_guide_price(&self, item_id: u32) -> Result<Option<Gp>, FlipError>;
}
