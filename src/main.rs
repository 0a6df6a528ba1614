//! GEFLIP — Grand Exchange flip suggestions
//!
//! Entry point. Parses and validates the command line, loads optional
//! configuration, initialises logging on stderr, then runs one
//! fetch→evaluate→enrich pass and prints the table.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{error::ErrorKind, CommandFactory, Parser};
use tracing::{debug, error, info};

use geflip::cli::Cli;
use geflip::config::AppConfig;
use geflip::engine::run_pipeline;
use geflip::limits::{self, TradeKind};
use geflip::market::catalogue::CatalogueClient;
use geflip::market::wiki::WikiPricesClient;
use geflip::market::GuidePriceSource;
use geflip::report::render_table;
use geflip::strategy::SuggestionEngine;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    // Usage errors exit 2 before anything touches the network
    if let Err(e) = cli.validate() {
        Cli::command().error(ErrorKind::ValueValidation, e).exit();
    }

    let cfg = AppConfig::load_or_default(cli.config.as_deref())?;
    init_logging(&cfg);

    let now = Utc::now();

    // -- Ledger-only mode --------------------------------------------------

    if let (Some((item_id, qty)), Some(path)) = (cli.record_buy(), cli.limits_file.as_deref()) {
        limits::record_trade(path, item_id, qty, TradeKind::Buy, now)?;
        info!(item_id, qty, path = %path.display(), "Buy recorded");
        println!("Recorded buy of {qty} x item {item_id} in {}", path.display());
        return Ok(());
    }

    // -- Clients -----------------------------------------------------------

    let budget = cli.budget.context("--budget is required")?;
    let user_agent = cfg.resolve_user_agent(cli.ua.as_deref());
    debug!(user_agent = %user_agent, "Resolved User-Agent");

    let wiki = WikiPricesClient::new(&cfg.api.wiki_base_url, &user_agent, cfg.api.timeout())?;
    let catalogue = if cli.with_ge {
        Some(CatalogueClient::new(
            &cfg.api.catalogue_detail_url,
            &user_agent,
            cfg.api.timeout(),
        )?)
    } else {
        None
    };

    let ledger = match cli.limits_file.as_deref() {
        Some(path) => Some(limits::load_ledger(path, now)?),
        None => None,
    };

    // -- Run ---------------------------------------------------------------

    let engine = SuggestionEngine::new(
        cli.pricing_config(),
        cli.profit_config(budget),
        cli.filter_config(),
    );

    let outcome = match run_pipeline(
        &wiki,
        catalogue.as_ref().map(|c| c as &dyn GuidePriceSource),
        &engine,
        ledger.as_ref(),
        now,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Run aborted");
            eprintln!("Failed to fetch market data: {e}");
            std::process::exit(1);
        }
    };

    info!(selection = ?outcome.selection, "Selection summary");

    print!("{}", render_table(&outcome.suggestions, &cli.report_options()));
    Ok(())
}

/// Logs go to stderr so stdout stays a clean table. `RUST_LOG` overrides
/// the configured filter; `GEFLIP_LOG_JSON` switches to JSON lines.
fn init_logging(cfg: &AppConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("geflip=warn"));

    let json_logging = std::env::var("GEFLIP_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
