use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use eyre::{WrapErr, eyre};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crypto_corruption_index::config;
use crypto_corruption_index::dashboard::Dashboard;
use crypto_corruption_index::events::types::severity_guideline;
use crypto_corruption_index::events::{EventFilter, EventType, NewPolicyEvent};
use crypto_corruption_index::logging;
use crypto_corruption_index::report;

#[derive(Debug, Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print events ordered by date
    List {
        #[arg(long)]
        country: Option<String>,
        /// sanctions, capital_control, banking_crisis, regulatory or other
        #[arg(long = "type")]
        event_type: Option<EventType>,
        #[arg(long)]
        min_severity: Option<u8>,
        #[arg(long)]
        json: bool,
    },
    /// Validate a new event and append it to an event file
    Add {
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long)]
        country: String,
        #[arg(long = "type")]
        event_type: EventType,
        /// 1 (minor) to 10 (extreme)
        #[arg(long)]
        severity: i64,
        #[arg(long, default_value = "")]
        description: String,
        /// Event file to append to; defaults to EVENTS_FILE
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Write every known event to a JSON file
    Export {
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the severity scale
    Guidelines,
}

#[instrument(name = "policy_events_main")]
#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();
    dotenv().ok();

    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME").to_string()) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    let cfg = config::Config::load()?;
    let store = Dashboard::load_event_store(&cfg)?;

    match args.command {
        Command::List { country, event_type, min_severity, json } => {
            let filter = EventFilter { country, event_type, min_severity };
            let events = store.list(&filter);
            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else {
                print!("{}", report::format_events(&events));
                for (country, count) in store.count_by_country() {
                    info!(%country, count, "Events by country");
                }
            }
        }
        Command::Add { date, country, event_type, severity, description, file } => {
            let path = resolve_event_file(file, cfg.events_file.as_ref())?;

            let record = NewPolicyEvent::new(date, country, event_type, severity, description);
            let event = store.add(record.clone())?;
            let total = append_record(&path, record)?;
            info!(path = %path.display(), total, "Event saved");

            println!("Added {}", event.label());
            if let Some(guideline) = severity_guideline(event.severity) {
                println!("Severity {}: {}", event.severity, guideline);
            }
        }
        Command::Export { out } => {
            let count = store.export_json(&out)?;
            println!("Exported {} events to {}", count, out.display());
        }
        Command::Guidelines => {
            for severity in 1..=10u8 {
                if let Some(text) = severity_guideline(severity) {
                    println!("{:>2}  {}", severity, text);
                }
            }
            for event_type in EventType::ALL {
                let range = event_type.typical_severity();
                println!(
                    "{:<16} {}-{}  {}",
                    event_type.as_str(),
                    range.start(),
                    range.end(),
                    event_type.description()
                );
            }
        }
    }
    Ok(())
}

/// `--file` wins over `EVENTS_FILE`; one of them is required before anything is added
fn resolve_event_file(file: Option<PathBuf>, configured: Option<&PathBuf>) -> eyre::Result<PathBuf> {
    file.or_else(|| configured.cloned())
        .ok_or_else(|| eyre!("No event file given; pass --file or set EVENTS_FILE"))
}

/// Append to a JSON event file holding only user-submitted records
fn append_record(path: &Path, record: NewPolicyEvent) -> eyre::Result<usize> {
    let mut records: Vec<NewPolicyEvent> = if path.exists() {
        let raw = fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).wrap_err_with(|| format!("Malformed event file {}", path.display()))?
    } else {
        Vec::new()
    };
    records.push(record);
    fs::write(path, serde_json::to_string_pretty(&records)?)
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    Ok(records.len())
}
