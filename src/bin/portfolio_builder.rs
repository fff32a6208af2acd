use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info, instrument};

use crypto_corruption_index::config;
use crypto_corruption_index::logging;
use crypto_corruption_index::portfolio::{AssetClass, PortfolioAllocation, PortfolioCalculator};
use crypto_corruption_index::report;

/// Blend static return assumptions for an allocation across asset classes.
///
/// Classes left unset keep the default 30/20/40/10 allocation.
#[derive(Debug, Parser)]
struct Args {
    /// Bitcoin weight in percent
    #[arg(long)]
    btc: Option<f64>,
    #[arg(long)]
    btc_leverage: Option<f64>,

    #[arg(long)]
    eth: Option<f64>,
    #[arg(long)]
    eth_leverage: Option<f64>,

    #[arg(long)]
    stable: Option<f64>,
    #[arg(long)]
    stable_leverage: Option<f64>,

    #[arg(long)]
    privacy: Option<f64>,
    #[arg(long)]
    privacy_leverage: Option<f64>,

    #[arg(long)]
    json: bool,
}

impl Args {
    fn allocation(&self) -> PortfolioAllocation {
        let defaults = PortfolioAllocation::default_allocation();
        let mut allocation = PortfolioAllocation::new();
        let overrides = [
            (AssetClass::Bitcoin, self.btc, self.btc_leverage),
            (AssetClass::Ethereum, self.eth, self.eth_leverage),
            (AssetClass::Stablecoins, self.stable, self.stable_leverage),
            (AssetClass::Privacy, self.privacy, self.privacy_leverage),
        ];
        for (class, weight, leverage) in overrides {
            let default = defaults.get(class).copied();
            let weight = weight.or(default.map(|p| p.weight_percent)).unwrap_or(0.0);
            let leverage = leverage
                .or(default.map(|p| p.leverage))
                .unwrap_or_else(|| class.recommended_leverage());
            allocation.set(class, weight, leverage);
        }
        allocation
    }
}

#[instrument(name = "portfolio_builder_main")]
#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();
    dotenv().ok();

    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME").to_string()) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    let cfg = config::Config::load()?;
    let calculator = PortfolioCalculator::new(cfg.return_assumptions.clone());
    let allocation = args.allocation();
    info!(total_weight = allocation.total_weight(), "Evaluating allocation");

    let metrics = match calculator.evaluate(&allocation) {
        Ok(metrics) => metrics,
        Err(e) => {
            error!(error = %e, "Allocation rejected");
            return Err(e.into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print!("{}", report::format_portfolio(&allocation, &metrics));
    }
    Ok(())
}
