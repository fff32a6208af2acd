use clap::Parser;
use dotenvy::dotenv;
use tracing::{info, instrument, warn};

use crypto_corruption_index::config;
use crypto_corruption_index::dashboard::Dashboard;
use crypto_corruption_index::logging;
use crypto_corruption_index::report;

/// Price correlations across tracked assets and aggregate stablecoin supply
#[derive(Debug, Parser)]
struct Args {
    #[arg(long)]
    json: bool,
}

#[instrument(name = "market_overview_main")]
#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();
    dotenv().ok();

    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME").to_string()) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    let cfg = config::Config::load()?;
    info!(assets = ?cfg.tracked_assets, "Configuration loaded");
    let events = Dashboard::load_event_store(&cfg)?;
    let dashboard = Dashboard::new(cfg, events)?;

    let overview = dashboard.market_overview().await;
    for warning in &overview.warnings {
        warn!(asset_id = %warning.asset_id, "{}", warning.message);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(());
    }
    print!("{}", report::format_correlations(&overview.correlations));
    println!();
    println!("{}", report::format_supply(&overview.stablecoin_supply));
    Ok(())
}
