//! Plain-text presentation of suggestions and gp amount parsing.
//!
//! Pure formatting: no business logic lives here. The table is padded
//! to column widths so it lines up in a terminal.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use crate::types::{FlipError, Gp, Suggestion};

/// Printed instead of the table when nothing survived the filters.
pub const NO_SUGGESTIONS_HINT: &str = "No suggestions matched your filters. \
Try lowering min ROI/profit, volume/freshness filters, or raising budget.";

// ---------------------------------------------------------------------------
// gp amounts
// ---------------------------------------------------------------------------

/// Format a gp value, optionally abbreviated to `k`/`m`/`b`.
pub fn format_gp(value: Gp, abbreviate: bool) -> String {
    if !abbreviate {
        return value.to_string();
    }
    let abs = value.unsigned_abs();
    let v = Decimal::from(value);
    if abs >= 1_000_000_000 {
        format!("{:.2}b", v / dec!(1_000_000_000))
    } else if abs >= 1_000_000 {
        format!("{:.2}m", v / dec!(1_000_000))
    } else if abs >= 1_000 {
        format!("{:.1}k", v / dec!(1_000))
    } else {
        value.to_string()
    }
}

/// Parse a human gp amount: `900000`, `900k`, `1.5m`, `2b`, `1,234`,
/// `10_000gp`. Fractions of a gp are truncated. Negative amounts are
/// rejected.
pub fn parse_gp_amount(text: &str) -> Result<Gp, FlipError> {
    let invalid = || FlipError::InvalidArgument(format!("invalid gp amount: {text:?}"));

    let cleaned = text.trim().to_lowercase().replace([',', '_'], "");
    let s = cleaned.strip_suffix("gp").unwrap_or(&cleaned).trim();

    let (number, multiplier) = if let Some(n) = s.strip_suffix('b') {
        (n, dec!(1_000_000_000))
    } else if let Some(n) = s.strip_suffix('m') {
        (n, dec!(1_000_000))
    } else if let Some(n) = s.strip_suffix('k') {
        (n, dec!(1_000))
    } else {
        (s, Decimal::ONE)
    };

    let value = number.trim().parse::<Decimal>().map_err(|_| invalid())?;
    let gp = value.checked_mul(multiplier).ok_or_else(invalid)?.trunc();
    if gp.is_sign_negative() && !gp.is_zero() {
        return Err(FlipError::InvalidArgument(format!(
            "gp amount must be non-negative: {text:?}"
        )));
    }
    gp.to_i64().ok_or_else(invalid)
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Presentation switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Abbreviate prices and profits (`1.50m`) instead of full integers.
    pub abbreviate: bool,
    /// Add the GE guide price column.
    pub with_guide: bool,
}

fn row(s: &Suggestion, opts: &ReportOptions) -> Vec<String> {
    let gp = |v: Gp| format_gp(v, opts.abbreviate);
    let optional = |v: Option<i64>| v.map_or_else(|| "-".to_string(), |v| v.to_string());

    let mut cells = vec![
        format!("{} ({})", s.item_name, s.item_id),
        gp(s.buy_price),
        gp(s.sell_price),
        s.quantity.to_string(),
        gp(s.unit_profit),
        gp(s.tax),
        gp(s.net_profit),
        format!("{:.2}%", s.roi * Decimal::ONE_HUNDRED),
        optional(s.buy_limit),
        optional(s.remaining_limit),
        s.buy_volume.to_string(),
        s.sell_volume.to_string(),
        format!("{:.2}", s.buy_fill_hours),
        format!("{:.2}", s.sell_fill_hours),
        // Rate is an estimate; always abbreviated.
        format_gp(s.profit_per_hour.trunc().to_i64().unwrap_or(Gp::MAX), true),
    ];
    if opts.with_guide {
        cells.push(s.guide_price.map_or_else(|| "-".to_string(), gp));
    }
    cells
}

fn pad_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c.as_ref(), width = *w))
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end()
        .to_string()
}

/// Render suggestions as an aligned text table, one line per suggestion
/// after a header and a rule. Returns the hint line when empty.
pub fn render_table(suggestions: &[Suggestion], opts: &ReportOptions) -> String {
    if suggestions.is_empty() {
        return format!("{NO_SUGGESTIONS_HINT}\n");
    }

    let mut headers = vec![
        "Item (ID)", "Buy", "Sell", "Qty", "Unit Profit", "Tax", "Total Profit", "ROI",
        "Limit", "Remain", "Buy Vol/h", "Sell Vol/h", "Buy h", "Sell h", "Gp/h",
    ];
    if opts.with_guide {
        headers.push("GE Price");
    }

    let rows: Vec<Vec<String>> = suggestions.iter().map(|s| row(s, opts)).collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&pad_line(&headers, &widths));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&pad_line(&rule, &widths));
    out.push('\n');
    for r in &rows {
        out.push_str(&pad_line(r, &widths));
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
