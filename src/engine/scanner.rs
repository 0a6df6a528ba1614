//! Market data fetcher.
//!
//! Pulls the mapping, latest-price and hourly-volume datasets (one call
//! each, in that order) and joins them by item id into `MarketRecord`s.
//! Any failed call aborts the scan; items missing from any dataset are
//! dropped.

use std::collections::HashMap;
use tracing::{debug, info};

use crate::market::MarketSource;
use crate::types::{FlipError, Item, MarketRecord, PriceQuote, VolumeWindow};

/// Fetches and joins the three bulk datasets.
pub struct MarketScanner<'a> {
    source: &'a dyn MarketSource,
}

impl<'a> MarketScanner<'a> {
    pub fn new(source: &'a dyn MarketSource) -> Self {
        Self { source }
    }

    /// Fetch all datasets and return the joined records, sorted by item id.
    pub async fn scan(&self) -> Result<Vec<MarketRecord>, FlipError> {
        let mapping = self.source.fetch_mapping().await?;
        let latest = self.source.fetch_latest().await?;
        let hourly = self.source.fetch_one_hour().await?;

        let mapped = mapping.len();
        let records = join(mapping, &latest, &hourly);

        info!(
            mapped,
            latest = latest.len(),
            hourly = hourly.len(),
            joined = records.len(),
            "Market scan complete"
        );

        Ok(records)
    }
}

/// Join item metadata with price and volume snapshots. Items absent from
/// either snapshot are dropped.
pub fn join(
    mapping: Vec<Item>,
    latest: &HashMap<u32, PriceQuote>,
    hourly: &HashMap<u32, VolumeWindow>,
) -> Vec<MarketRecord> {
    let mut records: Vec<MarketRecord> = mapping
        .into_iter()
        .filter_map(|item| {
            let (Some(quote), Some(volume)) = (latest.get(&item.id), hourly.get(&item.id)) else {
                debug!(item_id = item.id, "Missing price or volume data, skipping");
                return None;
            };
            Some(MarketRecord {
                item,
                quote: *quote,
                volume: *volume,
            })
        })
        .collect();

    records.sort_by_key(|r| r.item.id);
    records
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
