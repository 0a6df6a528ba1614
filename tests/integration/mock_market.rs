//! Mock market for integration testing.
//!
//! Provides deterministic `MarketSource` and `GuidePriceSource`
//! implementations that serve known items from memory and record every
//! call, so tests can assert on exactly which endpoints were hit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use geflip::market::{GuidePriceSource, MarketSource};
use geflip::types::*;

/// An in-memory bulk price API.
pub struct MockMarket {
    items: Vec<Item>,
    latest: HashMap<u32, PriceQuote>,
    one_hour: HashMap<u32, VolumeWindow>,
    calls: Arc<Mutex<Vec<&'static str>>>,
    /// If set, this endpoint returns a network error.
    fail_on: Arc<Mutex<Option<&'static str>>>,
    now: DateTime<Utc>,
}

impl MockMarket {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            items: Vec::new(),
            latest: HashMap::new(),
            one_hour: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on: Arc::new(Mutex::new(None)),
            now,
        }
    }

    /// Add an item traded a minute ago at `low`/`high` with the given
    /// hourly volumes on each side.
    #[allow(clippy::too_many_arguments)]
    pub fn with_item(
        mut self,
        id: u32,
        name: &str,
        buy_limit: Option<i64>,
        low: Gp,
        high: Gp,
        low_volume: i64,
        high_volume: i64,
    ) -> Self {
        let t = self.now.timestamp() - 60;
        self.items.push(Item {
            id,
            name: name.to_string(),
            buy_limit,
            members: Some(false),
        });
        self.latest.insert(
            id,
            PriceQuote {
                high: Some(high),
                high_time: Some(t),
                low: Some(low),
                low_time: Some(t),
            },
        );
        self.one_hour.insert(
            id,
            VolumeWindow {
                avg_high_price: Some(high),
                high_price_volume: high_volume,
                avg_low_price: Some(low),
                low_price_volume: low_volume,
            },
        );
        self
    }

    /// Add mapping metadata with no price data at all.
    pub fn with_unpriced_item(mut self, id: u32, name: &str) -> Self {
        self.items.push(Item {
            id,
            name: name.to_string(),
            buy_limit: Some(100),
            members: None,
        });
        self
    }

    /// Force one endpoint (`mapping`, `latest` or `1h`) to fail.
    pub fn fail_on(&self, endpoint: &'static str) {
        *self.fail_on.lock().unwrap() = Some(endpoint);
    }

    /// Endpoints called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn hit(&self, endpoint: &'static str) -> Result<(), FlipError> {
        self.calls.lock().unwrap().push(endpoint);
        if *self.fail_on.lock().unwrap() == Some(endpoint) {
            return Err(FlipError::network(endpoint, "connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketSource for MockMarket {
    async fn fetch_mapping(&self) -> Result<Vec<Item>, FlipError> {
        self.hit("mapping")?;
        Ok(self.items.clone())
    }

    async fn fetch_latest(&self) -> Result<HashMap<u32, PriceQuote>, FlipError> {
        self.hit("latest")?;
        Ok(self.latest.clone())
    }

    async fn fetch_one_hour(&self) -> Result<HashMap<u32, VolumeWindow>, FlipError> {
        self.hit("1h")?;
        Ok(self.one_hour.clone())
    }
}

/// An in-memory guide price catalogue.
pub struct MockGuide {
    prices: HashMap<u32, Gp>,
    failing: HashSet<u32>,
    calls: Arc<Mutex<Vec<u32>>>,
}

impl MockGuide {
    pub fn new(prices: &[(u32, Gp)]) -> Self {
        Self {
            prices: prices.iter().copied().collect(),
            failing: HashSet::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Lookups for this item return a network error.
    pub fn failing_for(mut self, item_id: u32) -> Self {
        self.failing.insert(item_id);
        self
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GuidePriceSource for MockGuide {
    async fn fetch_guide_price(&self, item_id: u32) -> Result<Option<Gp>, FlipError> {
        self.calls.lock().unwrap().push(item_id);
        if self.failing.contains(&item_id) {
            return Err(FlipError::network("catalogue", "timed out"));
        }
        Ok(self.prices.get(&item_id).copied())
    }
}
