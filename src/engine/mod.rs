//! Core engine — the fetch → evaluate → enrich pipeline.
//!
//! Stages run strictly one after another with no feedback: scan the
//! market, build ranked suggestions, then optionally look up guide prices
//! for the survivors.

pub mod enricher;
pub mod scanner;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::limits::LimitLedger;
use crate::market::{GuidePriceSource, MarketSource};
use crate::strategy::{SelectionReport, SuggestionEngine};
use crate::types::{FlipError, Suggestion};
use enricher::GuideEnricher;
use scanner::MarketScanner;

/// Result of one run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub suggestions: Vec<Suggestion>,
    pub selection: SelectionReport,
    /// Joined records that entered evaluation.
    pub records: usize,
    /// Suggestions that received a guide price (0 when not requested).
    pub guide_prices_resolved: usize,
}

/// Run the full pipeline once.
///
/// `guide` is only consulted when `Some`; pass `None` to skip the
/// catalogue entirely. `ledger` caps quantities at the remaining buy limit.
pub async fn run_pipeline(
    market: &dyn MarketSource,
    guide: Option<&dyn GuidePriceSource>,
    engine: &SuggestionEngine,
    ledger: Option<&LimitLedger>,
    now: DateTime<Utc>,
) -> Result<RunOutcome, FlipError> {
    // 1. Fetch and join (fatal on failure)
    let records = MarketScanner::new(market).scan().await?;

    // 2. Evaluate, filter, rank
    let remaining = ledger.map(|l| {
        l.remaining_limits(records.iter().map(|r| (r.item.id, r.item.buy_limit)), now)
    });
    let (mut suggestions, selection) =
        engine.build_suggestions(&records, remaining.as_ref(), now);

    // 3. Optional display enrichment (never fatal)
    let guide_prices_resolved = match guide {
        Some(source) if !suggestions.is_empty() => {
            GuideEnricher::new(source).enrich(&mut suggestions).await
        }
        _ => 0,
    };

    info!(
        records = records.len(),
        suggestions = suggestions.len(),
        guide_prices_resolved,
        "Run complete"
    );

    Ok(RunOutcome {
        suggestions,
        selection,
        records: records.len(),
        guide_prices_resolved,
    })
}
