//! End-to-end pipeline tests against the in-memory market.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;

use geflip::engine::{run_pipeline, RunOutcome};
use geflip::limits::{self, TradeKind};
use geflip::market::GuidePriceSource;
use geflip::report::{render_table, ReportOptions, NO_SUGGESTIONS_HINT};
use geflip::strategy::pricing::PricingConfig;
use geflip::strategy::profit::{ProfitConfig, GE_TAX_CAP};
use geflip::strategy::{FilterConfig, SuggestionEngine};
use geflip::types::{FlipError, Gp};

use crate::mock_market::{MockGuide, MockMarket};

fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

fn engine(profit: ProfitConfig, filter: FilterConfig) -> SuggestionEngine {
    SuggestionEngine::new(PricingConfig::default(), profit, filter)
}

/// No aggressiveness, full liquidity, no thresholds: raw arithmetic.
fn plain_engine(budget: Gp, top: usize) -> SuggestionEngine {
    engine(
        ProfitConfig {
            budget,
            aggressiveness: Decimal::ZERO,
            liquidity_fraction: Decimal::ONE,
            max_fill_hours: dec!(1.5),
        },
        FilterConfig {
            min_roi: Decimal::ZERO,
            min_unit_profit: 0,
            min_hourly_volume: 0,
            top,
        },
    )
}

async fn run(market: &MockMarket, guide: Option<&MockGuide>, e: &SuggestionEngine) -> RunOutcome {
    run_pipeline(market, guide.map(|g| g as &dyn GuidePriceSource), e, None, now())
        .await
        .unwrap()
}

fn ids(outcome: &RunOutcome) -> Vec<u32> {
    outcome.suggestions.iter().map(|s| s.item_id).collect()
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_worked_example_end_to_end() {
    let market = MockMarket::new(now()).with_item(1, "Test item", None, 100, 110, 1_000, 1_000);

    let outcome = run(&market, None, &plain_engine(100_000, 10)).await;
    assert_eq!(outcome.suggestions.len(), 1);

    let s = &outcome.suggestions[0];
    assert_eq!(s.quantity, 1_000);
    assert_eq!(s.cost, 100_000);
    assert_eq!(s.gross_sell, 110_000);
    assert_eq!(s.tax, 2_200);
    assert_eq!(s.net_profit, 7_800);
    assert_eq!(s.roi, dec!(0.078));

    let table = render_table(&outcome.suggestions, &ReportOptions::default());
    assert!(table.contains("Test item (1)"));
    assert!(table.contains("7800"));
    assert!(table.contains("7.80%"));
}

#[tokio::test]
async fn test_invariants_hold_across_market() {
    let mut market = MockMarket::new(now());
    for i in 1..=80u32 {
        let n = i64::from(i);
        let low = 50 + (n * 37) % 5_000;
        let high = low + (n * 13) % 400;
        let limit = if i % 7 == 0 { None } else { Some((n * 17) % 2_000) };
        market = market.with_item(
            i,
            &format!("Item {i}"),
            limit,
            low,
            high,
            (n * 71) % 3_000,
            (n * 53) % 3_000,
        );
    }
    // At least one sure winner
    market = market.with_item(999, "Sure thing", Some(1_000), 1_000, 1_200, 5_000, 5_000);

    let budget = 1_000_000;
    let e = engine(
        ProfitConfig {
            budget,
            ..Default::default()
        },
        FilterConfig {
            min_roi: Decimal::ZERO,
            min_unit_profit: 1,
            min_hourly_volume: 100,
            top: 15,
        },
    );
    let outcome = run(&market, None, &e).await;
    let suggestions = &outcome.suggestions;

    assert!(!suggestions.is_empty());
    assert!(suggestions.len() <= 15);

    for s in suggestions {
        assert!(s.quantity >= 1, "{s}");
        if let Some(limit) = s.buy_limit {
            assert!(s.quantity <= limit, "{s}");
        }
        assert!(s.quantity * s.buy_price <= budget, "{s}");
        // liquidity 0.25 and 1.5 fill hours against the thinner side
        assert!(s.quantity * 4 <= s.hourly_volume, "{s}");
        assert!(s.quantity * 2 <= s.hourly_volume * 3, "{s}");

        assert_eq!(s.tax, (s.sell_price * s.quantity / 50).min(GE_TAX_CAP));
        assert!(s.tax <= GE_TAX_CAP);
        assert_eq!(s.net_profit, s.gross_sell - s.tax - s.cost);
        assert_eq!(s.cost, s.quantity * s.buy_price);

        assert!(s.roi >= Decimal::ZERO);
        assert!(s.unit_profit >= 1);
        assert!(s.hourly_volume >= 100);
    }

    for pair in suggestions.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.net_profit > b.net_profit || (a.net_profit == b.net_profit && a.roi >= b.roi),
            "{a} before {b}"
        );
    }
}

// ---------------------------------------------------------------------------
// Ranking and filtering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_ranking_and_top_n() {
    let market = MockMarket::new(now())
        .with_item(10, "Mid", Some(100), 1_000, 1_100, 10_000, 10_000)
        .with_item(5, "Twin B", Some(1_000), 100, 200, 10_000, 10_000)
        .with_item(3, "Twin A", Some(1_000), 100, 200, 10_000, 10_000)
        .with_item(7, "Small", Some(10), 500, 600, 10_000, 10_000);

    let all = run(&market, None, &plain_engine(10_000_000, 10)).await;
    // Equal net and ROI fall back to id order
    assert_eq!(ids(&all), vec![3, 5, 10, 7]);
    assert_eq!(all.suggestions[0].net_profit, 96_000);
    assert_eq!(all.suggestions[2].net_profit, 7_800);
    assert_eq!(all.suggestions[3].net_profit, 880);

    let top = run(&market, None, &plain_engine(10_000_000, 3)).await;
    assert_eq!(ids(&top), vec![3, 5, 10]);
    assert_eq!(top.selection.qualified, 4);
}

#[tokio::test]
async fn test_default_thresholds_filter_candidates() {
    let market = MockMarket::new(now())
        .with_item(1, "Good", Some(100), 10_000, 11_000, 2_000, 2_000)
        .with_item(2, "Thin", Some(100), 10_000, 11_000, 400, 2_000)
        .with_item(3, "Cheap", Some(10_000), 100, 110, 100_000, 100_000)
        .with_unpriced_item(4, "Unpriced");

    let e = engine(
        ProfitConfig {
            budget: 10_000_000,
            ..Default::default()
        },
        FilterConfig::default(),
    );
    let outcome = run(&market, None, &e).await;

    assert_eq!(outcome.records, 3);
    assert_eq!(ids(&outcome), vec![1]);
    assert_eq!(outcome.selection.low_volume, 1);
    assert_eq!(outcome.selection.below_thresholds, 1);

    // spread 1000 at aggressiveness 0.3 → 75 gp shift each side
    let s = &outcome.suggestions[0];
    assert_eq!((s.buy_price, s.sell_price), (10_075, 10_925));
    assert_eq!(s.quantity, 100);
    assert_eq!(s.tax, 21_850);
    assert_eq!(s.net_profit, 63_150);
}

#[tokio::test]
async fn test_nothing_qualifies_prints_hint() {
    let market = MockMarket::new(now()).with_item(1, "Flat", Some(100), 1_000, 1_000, 5_000, 5_000);
    let outcome = run(&market, None, &engine(ProfitConfig::default(), FilterConfig::default())).await;

    assert!(outcome.suggestions.is_empty());
    let table = render_table(&outcome.suggestions, &ReportOptions::default());
    assert_eq!(table.trim_end(), NO_SUGGESTIONS_HINT);
}

// ---------------------------------------------------------------------------
// Network behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_market_failure_aborts_run() {
    let market = MockMarket::new(now()).with_item(1, "Test item", None, 100, 110, 1_000, 1_000);
    market.fail_on("latest");
    let guide = MockGuide::new(&[(1, 105)]);

    let result = run_pipeline(
        &market,
        Some(&guide as &dyn GuidePriceSource),
        &plain_engine(100_000, 10),
        None,
        now(),
    )
    .await;

    assert!(matches!(result, Err(FlipError::Network { .. })));
    assert_eq!(market.calls(), vec!["mapping", "latest"]);
    assert!(guide.calls().is_empty());
}

#[tokio::test]
async fn test_without_guide_only_bulk_calls() {
    let market = MockMarket::new(now())
        .with_item(1, "A", None, 100, 110, 1_000, 1_000)
        .with_item(2, "B", None, 200, 230, 1_000, 1_000);

    let outcome = run(&market, None, &plain_engine(100_000, 10)).await;

    assert_eq!(market.calls(), vec!["mapping", "latest", "1h"]);
    assert_eq!(outcome.guide_prices_resolved, 0);
    assert!(outcome.suggestions.iter().all(|s| s.guide_price.is_none()));

    let table = render_table(&outcome.suggestions, &ReportOptions::default());
    assert!(!table.contains("GE Price"));
}

#[tokio::test]
async fn test_guide_lookup_per_suggestion_and_non_fatal() {
    let market = MockMarket::new(now())
        .with_item(1, "A", None, 100, 200, 1_000, 1_000)
        .with_item(2, "B", None, 100, 190, 1_000, 1_000)
        .with_item(3, "C", None, 100, 180, 1_000, 1_000)
        .with_item(4, "D", None, 100, 170, 1_000, 1_000);
    let guide = MockGuide::new(&[(1, 150), (3, 140)]).failing_for(3);

    let outcome = run(&market, Some(&guide), &plain_engine(1_000_000, 3)).await;

    assert_eq!(ids(&outcome), vec![1, 2, 3]);
    // Only displayed suggestions are looked up, in display order
    assert_eq!(guide.calls(), vec![1, 2, 3]);
    assert_eq!(outcome.guide_prices_resolved, 1);

    let guide_prices: Vec<_> = outcome.suggestions.iter().map(|s| s.guide_price).collect();
    assert_eq!(guide_prices, vec![Some(150), None, None]);

    let opts = ReportOptions {
        with_guide: true,
        ..Default::default()
    };
    assert!(render_table(&outcome.suggestions, &opts).contains("GE Price"));
}

#[tokio::test]
async fn test_guide_not_called_when_nothing_qualifies() {
    let market = MockMarket::new(now()).with_item(1, "Flat", None, 1_000, 1_000, 5_000, 5_000);
    let guide = MockGuide::new(&[(1, 1_000)]);

    let e = engine(ProfitConfig::default(), FilterConfig::default());
    let outcome = run(&market, Some(&guide), &e).await;

    assert!(outcome.suggestions.is_empty());
    assert!(guide.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Buy-limit ledger
// ---------------------------------------------------------------------------

fn temp_ledger() -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("geflip_it_ledger_{}.json", uuid::Uuid::new_v4()));
    p
}

#[tokio::test]
async fn test_ledger_caps_remaining_limit() {
    let path = temp_ledger();
    let earlier = now() - chrono::Duration::hours(1);
    limits::record_trade(&path, 3, 600, TradeKind::Buy, earlier).unwrap();
    limits::record_trade(&path, 5, 1_000, TradeKind::Buy, earlier).unwrap();
    // Outside the 4h window, ignored
    limits::record_trade(&path, 10, 100, TradeKind::Buy, now() - chrono::Duration::hours(5))
        .unwrap();

    let market = MockMarket::new(now())
        .with_item(3, "Partly used", Some(1_000), 100, 200, 10_000, 10_000)
        .with_item(5, "Used up", Some(1_000), 100, 200, 10_000, 10_000)
        .with_item(10, "Fresh", Some(100), 1_000, 1_100, 10_000, 10_000);

    let ledger = limits::load_ledger(&path, now()).unwrap();
    let outcome = run_pipeline(
        &market,
        None,
        &plain_engine(10_000_000, 10),
        Some(&ledger),
        now(),
    )
    .await
    .unwrap();

    assert_eq!(ids(&outcome), vec![3, 10]);
    assert_eq!(outcome.suggestions[0].quantity, 400);
    assert_eq!(outcome.suggestions[0].remaining_limit, Some(400));
    assert_eq!(outcome.suggestions[1].quantity, 100);
    assert_eq!(outcome.suggestions[1].remaining_limit, Some(100));
    assert_eq!(outcome.selection.unfillable, 1);

    std::fs::remove_file(&path).unwrap();
}
