//! Official Grand Exchange catalogue integration.
//!
//! Used only to display the guide price next to a suggestion. The guide
//! price lags the real market by a day or more, so it never feeds into
//! profit math.
//!
//! Endpoint: `catalogue/detail.json?item={id}`
//! Response: `{"item": {"current": {"trend": "neutral", "price": "12.3k"}, ...}}`
//! `price` is either a number or an abbreviated string.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::GuidePriceSource;
use crate::report::parse_gp_amount;
use crate::types::{FlipError, Gp};

const ENDPOINT: &str = "catalogue";

#[derive(Debug, Deserialize)]
struct WireDetail {
    #[serde(default)]
    item: Option<WireDetailItem>,
}

#[derive(Debug, Deserialize)]
struct WireDetailItem {
    #[serde(default)]
    current: Option<WireCurrent>,
}

#[derive(Debug, Deserialize)]
struct WireCurrent {
    #[serde(default)]
    price: Option<serde_json::Value>,
}

/// Interpret the catalogue's price field: `243`, `"1,234"`, `"12.3k"`,
/// `"2.1m"`, `"1.5b"`. Anything else (e.g. `"unknown"`) is `None`.
pub fn parse_guide_price(value: &serde_json::Value) -> Option<Gp> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .filter(|p| *p >= 0),
        serde_json::Value::String(s) => parse_gp_amount(s).ok(),
        _ => None,
    }
}

fn extract_price(detail: WireDetail) -> Option<Gp> {
    detail
        .item
        .and_then(|i| i.current)
        .and_then(|c| c.price)
        .as_ref()
        .and_then(parse_guide_price)
}

/// GE catalogue client.
pub struct CatalogueClient {
    http: Client,
    detail_url: String,
}

impl CatalogueClient {
    pub fn new(detail_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client for GE catalogue")?;

        Ok(Self {
            http,
            detail_url: detail_url.to_string(),
        })
    }
}

#[async_trait]
impl GuidePriceSource for CatalogueClient {
    async fn fetch_guide_price(&self, item_id: u32) -> Result<Option<Gp>, FlipError> {
        debug!(item_id, "Fetching GE guide price");

        let resp = self
            .http
            .get(&self.detail_url)
            .query(&[("item", item_id)])
            .send()
            .await
            .map_err(|e| FlipError::network(ENDPOINT, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(FlipError::network(ENDPOINT, format!("HTTP {status} for item {item_id}")));
        }

        let detail: WireDetail = resp
            .json()
            .await
            .map_err(|e| FlipError::decode(ENDPOINT, e))?;

        Ok(extract_price(detail))
    }
}
