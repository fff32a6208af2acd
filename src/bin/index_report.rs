use clap::Parser;
use dotenvy::dotenv;
use tracing::{info, instrument, warn};

use crypto_corruption_index::config;
use crypto_corruption_index::dashboard::Dashboard;
use crypto_corruption_index::logging;
use crypto_corruption_index::report;

/// Compute the daily Corruption Index for the benchmark asset
#[derive(Debug, Parser)]
struct Args {
    /// Number of most recent days to print
    #[arg(long, default_value_t = 14)]
    rows: usize,

    /// Override LOOKBACK_DAYS
    #[arg(long)]
    lookback_days: Option<u32>,

    /// Print the full result as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[instrument(name = "index_report_main")]
#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();

    // Load environment variables from .env file
    dotenv().ok();

    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME").to_string()) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    let mut cfg = config::Config::load()?;
    if let Some(days) = args.lookback_days {
        cfg.lookback_days = days;
    }
    info!(benchmark = %cfg.index_params.benchmark_asset, lookback_days = cfg.lookback_days, "Configuration loaded");

    let events = Dashboard::load_event_store(&cfg)?;
    let dashboard = Dashboard::new(cfg, events)?;
    let refresh = dashboard.refresh_index().await;

    for warning in &refresh.warnings {
        warn!(asset_id = %warning.asset_id, "{}", warning.message);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&refresh)?);
        return Ok(());
    }

    if let Some(reason) = &refresh.unavailable {
        println!("Index unavailable: {}", reason);
        return Ok(());
    }
    match report::summarize_index(&refresh.scores) {
        Some(summary) => {
            println!("{}", report::format_index_summary(&summary));
            println!();
            print!("{}", report::format_index_table(&refresh.scores, args.rows));
        }
        None => println!("No market data available, index not computed"),
    }
    Ok(())
}
