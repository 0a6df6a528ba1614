//! Local buy-limit ledger.
//!
//! GE buy limits reset on a rolling 4-hour window. The ledger is a small
//! JSON file of recorded trades so suggestions can be capped at what is
//! still buyable. It is opt-in: nothing is read or written unless a path
//! is given.
//!
//! Format: `{"version": 1, "events": [{"ts", "item_id", "type", "qty"}]}`

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::types::FlipError;

/// Length of the buy-limit window.
pub const LIMIT_WINDOW_SECS: i64 = 4 * 60 * 60;

/// Events older than two windows are dropped on load.
const PRUNE_AFTER_SECS: i64 = 2 * LIMIT_WINDOW_SECS;

const LEDGER_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitEvent {
    /// Unix seconds.
    #[serde(default)]
    pub ts: i64,
    pub item_id: u32,
    #[serde(rename = "type")]
    pub kind: TradeKind,
    #[serde(default)]
    pub qty: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitLedger {
    pub version: u32,
    pub events: Vec<LimitEvent>,
}

impl Default for LimitLedger {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION,
            events: Vec::new(),
        }
    }
}

/// On-disk shape, tolerant of malformed events.
#[derive(Debug, Deserialize)]
struct RawLedger {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    events: Vec<serde_json::Value>,
}

impl LimitLedger {
    /// Parse ledger JSON, skipping malformed events and pruning old ones.
    pub fn from_json(json: &str, now: DateTime<Utc>) -> Result<Self, FlipError> {
        let raw: RawLedger =
            serde_json::from_str(json).map_err(|e| FlipError::Ledger(e.to_string()))?;

        let cutoff = now.timestamp() - PRUNE_AFTER_SECS;
        let total = raw.events.len();
        let events: Vec<LimitEvent> = raw
            .events
            .into_iter()
            .filter_map(|v| serde_json::from_value::<LimitEvent>(v).ok())
            .filter(|e| e.ts >= cutoff)
            .collect();

        if events.len() < total {
            debug!(kept = events.len(), total, "Dropped malformed or expired ledger events");
        }

        Ok(Self {
            version: raw.version.unwrap_or(LEDGER_VERSION),
            events,
        })
    }

    pub fn record(&mut self, item_id: u32, qty: i64, kind: TradeKind, now: DateTime<Utc>) {
        self.events.push(LimitEvent {
            ts: now.timestamp(),
            item_id,
            kind,
            qty,
        });
    }

    /// Units bought per item inside the current window.
    pub fn bought_in_window(&self, now: DateTime<Utc>) -> HashMap<u32, i64> {
        let cutoff = now.timestamp() - LIMIT_WINDOW_SECS;
        let mut used: HashMap<u32, i64> = HashMap::new();
        for e in &self.events {
            if e.kind != TradeKind::Buy || e.ts < cutoff {
                continue;
            }
            *used.entry(e.item_id).or_default() += e.qty.max(0);
        }
        used
    }

    /// Remaining buy limit per item, floored at zero. Items without a known
    /// limit are omitted.
    pub fn remaining_limits<I>(&self, buy_limits: I, now: DateTime<Utc>) -> HashMap<u32, i64>
    where
        I: IntoIterator<Item = (u32, Option<i64>)>,
    {
        let used = self.bought_in_window(now);
        buy_limits
            .into_iter()
            .filter_map(|(id, limit)| {
                let limit = limit?;
                let already = used.get(&id).copied().unwrap_or(0);
                Some((id, (limit - already).max(0)))
            })
            .collect()
    }
}

/// Load the ledger. A missing file is an empty ledger.
pub fn load_ledger(path: &Path, now: DateTime<Utc>) -> Result<LimitLedger> {
    if !path.exists() {
        info!(path = %path.display(), "No limit ledger found, starting empty");
        return Ok(LimitLedger::default());
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read limit ledger from {}", path.display()))?;

    let ledger = LimitLedger::from_json(&json, now)
        .with_context(|| format!("Failed to parse limit ledger from {}", path.display()))?;

    debug!(path = %path.display(), events = ledger.events.len(), "Limit ledger loaded");
    Ok(ledger)
}

/// Save the ledger, creating parent directories as needed.
pub fn save_ledger(ledger: &LimitLedger, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(ledger).context("Failed to serialise limit ledger")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write limit ledger to {}", path.display()))?;

    debug!(path = %path.display(), events = ledger.events.len(), "Limit ledger saved");
    Ok(())
}

/// Append one trade to the ledger file.
pub fn record_trade(
    path: &Path,
    item_id: u32,
    qty: i64,
    kind: TradeKind,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut ledger = load_ledger(path, now)?;
    ledger.record(item_id, qty, kind, now);
    save_ledger(&ledger, path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
