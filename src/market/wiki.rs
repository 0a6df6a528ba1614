//! OSRS Wiki real-time prices integration.
//!
//! Bulk endpoints used once per run:
//! - `/mapping` — item metadata (name, buy limit, members flag)
//! - `/latest`  — most recent instant buy/sell price with timestamps
//! - `/1h`      — one-hour average prices and traded volume
//!
//! API docs: https://oldschool.runescape.wiki/w/RuneScape:Real-time_Prices
//! Auth: none, but a descriptive `User-Agent` is required; generic agents
//! get blocked.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use super::MarketSource;
use crate::types::{FlipError, Gp, Item, PriceQuote, VolumeWindow};

// ---------------------------------------------------------------------------
// API response types (wiki JSON → Rust)
// ---------------------------------------------------------------------------

/// One element of the `/mapping` array. Only the fields we use.
#[derive(Debug, Deserialize)]
struct WireMappingEntry {
    #[serde(alias = "item")]
    id: u32,
    #[serde(default)]
    name: Option<String>,
    /// GE buy limit; absent for some untradeable or new items.
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    members: Option<bool>,
}

/// `{"data": {"<id>": {...}}}` envelope shared by `/latest` and `/1h`.
#[derive(Debug, Deserialize)]
struct WireKeyed<T> {
    #[serde(default = "HashMap::new")]
    data: HashMap<String, T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLatest {
    #[serde(default)]
    high: Option<Gp>,
    #[serde(default)]
    high_time: Option<i64>,
    #[serde(default)]
    low: Option<Gp>,
    #[serde(default)]
    low_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOneHour {
    #[serde(default)]
    avg_high_price: Option<Gp>,
    #[serde(default)]
    high_price_volume: Option<i64>,
    #[serde(default)]
    avg_low_price: Option<Gp>,
    #[serde(default)]
    low_price_volume: Option<i64>,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

fn to_item(entry: WireMappingEntry) -> Item {
    let name = entry.name.unwrap_or_else(|| entry.id.to_string());
    Item {
        id: entry.id,
        name,
        buy_limit: entry.limit,
        members: entry.members,
    }
}

fn to_quote(w: WireLatest) -> PriceQuote {
    PriceQuote {
        high: w.high,
        high_time: w.high_time,
        low: w.low,
        low_time: w.low_time,
    }
}

fn to_window(w: WireOneHour) -> VolumeWindow {
    VolumeWindow {
        avg_high_price: w.avg_high_price,
        high_price_volume: w.high_price_volume.unwrap_or(0).max(0),
        avg_low_price: w.avg_low_price,
        low_price_volume: w.low_price_volume.unwrap_or(0).max(0),
    }
}

/// Re-key an id-keyed map by numeric id, skipping keys that aren't ids.
fn rekey<T, U>(data: HashMap<String, T>, convert: impl Fn(T) -> U) -> HashMap<u32, U> {
    data.into_iter()
        .filter_map(|(key, value)| match key.parse::<u32>() {
            Ok(id) => Some((id, convert(value))),
            Err(_) => {
                debug!(key = %key, "Skipping non-numeric item key");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// OSRS Wiki real-time prices client.
pub struct WikiPricesClient {
    http: Client,
    base_url: String,
}

impl WikiPricesClient {
    /// Create a new client. `user_agent` is sent on every request.
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client for wiki prices")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }

    /// GET `{base}/{endpoint}` and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, FlipError> {
        let url = self.url(endpoint);
        debug!(url = %url, "Fetching wiki prices");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FlipError::network(endpoint, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(FlipError::network(endpoint, format!("HTTP {status}: {body}")));
        }

        resp.json::<T>()
            .await
            .map_err(|e| FlipError::decode(endpoint, e))
    }
}

#[async_trait]
impl MarketSource for WikiPricesClient {
    async fn fetch_mapping(&self) -> Result<Vec<Item>, FlipError> {
        let entries: Vec<WireMappingEntry> = self.get_json("mapping").await?;
        let items: Vec<Item> = entries.into_iter().map(to_item).collect();
        info!(count = items.len(), "Item mapping fetched");
        Ok(items)
    }

    async fn fetch_latest(&self) -> Result<HashMap<u32, PriceQuote>, FlipError> {
        let payload: WireKeyed<WireLatest> = self.get_json("latest").await?;
        let quotes = rekey(payload.data, to_quote);
        info!(count = quotes.len(), "Latest prices fetched");
        Ok(quotes)
    }

    async fn fetch_one_hour(&self) -> Result<HashMap<u32, VolumeWindow>, FlipError> {
        let payload: WireKeyed<WireOneHour> = self.get_json("1h").await?;
        let windows = rekey(payload.data, to_window);
        info!(count = windows.len(), "Hourly volumes fetched");
        Ok(windows)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
