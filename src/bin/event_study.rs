use clap::Parser;
use dotenvy::dotenv;
use eyre::eyre;
use serde_json::json;
use tracing::{info, instrument, warn};

use crypto_corruption_index::config;
use crypto_corruption_index::dashboard::Dashboard;
use crypto_corruption_index::logging;
use crypto_corruption_index::report;

const HEADLINE_OFFSETS: [i64; 6] = [-7, -1, 1, 7, 14, 30];

/// Price reaction of tracked assets around a policy event
#[derive(Debug, Parser)]
struct Args {
    /// Event id; defaults to the most recent event
    #[arg(long)]
    event_id: Option<u64>,

    /// Comma separated CoinGecko ids; defaults to TRACKED_ASSETS
    #[arg(long, value_delimiter = ',')]
    assets: Option<Vec<String>>,

    /// Print the available events and exit
    #[arg(long)]
    list: bool,

    #[arg(long)]
    json: bool,
}

#[instrument(name = "event_study_main")]
#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();
    dotenv().ok();

    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME").to_string()) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    let cfg = config::Config::load()?;
    let events = Dashboard::load_event_store(&cfg)?;
    info!(events = events.len(), "Event store loaded");

    if args.list {
        print!("{}", report::format_events(&events.all()));
        return Ok(());
    }

    let event_id = match args.event_id {
        Some(id) => id,
        None => events.latest().map(|e| e.id).ok_or_else(|| eyre!("Event store is empty"))?,
    };

    let dashboard = Dashboard::new(cfg, events)?;
    let window_days = dashboard.config().event_study_window_days;
    let (study, warnings) = dashboard.run_event_study(event_id, args.assets).await?;
    for warning in &warnings {
        warn!(asset_id = %warning.asset_id, "{}", warning.message);
    }

    if args.json {
        let unavailable: Vec<_> = study
            .unavailable
            .iter()
            .map(|(asset, reason)| json!({ "asset_id": asset, "reason": reason.to_string() }))
            .collect();
        let out = json!({
            "event": study.event,
            "window_days": study.window_days,
            "windows": study.windows,
            "crisis_response": study.crisis_response,
            "unavailable": unavailable,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let offsets: Vec<i64> = HEADLINE_OFFSETS
        .iter()
        .copied()
        .filter(|o| o.abs() <= window_days)
        .collect();
    print!("{}", report::format_event_study(&study, &offsets));
    Ok(())
}
