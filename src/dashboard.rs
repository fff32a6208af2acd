use chrono::{NaiveDate, Utc};
use eyre::{Result, eyre};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::CoreResult;
use crate::event_study::{EventStudy, EventStudyEngine};
use crate::events::EventStore;
use crate::index::{IndexEngine, IndexScore};
use crate::market_data::correlation::{CorrelationMatrix, correlation_matrix};
use crate::market_data::stablecoin_supply::{StablecoinSupply, StablecoinSupplySource};
use crate::market_data::{FetchWarning, MarketDataFetcher};
use crate::portfolio::{PortfolioAllocation, PortfolioCalculator, PortfolioMetrics};

/// Index series plus whatever went wrong while gathering its inputs
#[derive(Debug, Clone, Serialize)]
pub struct IndexRefresh {
    pub scores: Vec<IndexScore>,
    pub warnings: Vec<FetchWarning>,
    /// Set when the index itself could not be computed
    pub unavailable: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketOverview {
    pub correlations: CorrelationMatrix,
    pub stablecoin_supply: StablecoinSupply,
    pub warnings: Vec<FetchWarning>,
}

/// Wires the fetcher, the event store and the engines together for one
/// user action at a time
pub struct Dashboard {
    config: Config,
    fetcher: MarketDataFetcher,
    supply_source: StablecoinSupplySource,
    events: Arc<EventStore>,
    index_engine: IndexEngine,
    study_engine: EventStudyEngine,
    portfolio: PortfolioCalculator,
}

impl Dashboard {
    pub fn new(config: Config, events: Arc<EventStore>) -> Result<Self> {
        let fetcher = MarketDataFetcher::new(&config)?;
        let supply_source = StablecoinSupplySource::new(&config)?;
        let index_engine = IndexEngine::new(config.index_weights, config.index_params.clone())?;
        let study_engine = EventStudyEngine::new(config.event_study_window_days, config.crisis_window_days)?;
        let portfolio = PortfolioCalculator::new(config.return_assumptions.clone());
        Ok(Self {
            config,
            fetcher,
            supply_source,
            events,
            index_engine,
            study_engine,
            portfolio,
        })
    }

    /// Seeded event store, extended from `EVENTS_FILE` when configured
    pub fn load_event_store(config: &Config) -> Result<Arc<EventStore>> {
        let store = EventStore::seeded();
        if let Some(path) = &config.events_file {
            let imported = store.import_json(path)?;
            info!(imported, path = %path.display(), "Loaded additional policy events");
        }
        Ok(Arc::new(store))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventStore> {
        &self.events
    }

    /// Fetch the benchmark series and recompute the index over the lookback
    #[instrument(skip(self), fields(on_close = true))]
    pub async fn refresh_index(&self) -> IndexRefresh {
        let benchmark = self.config.index_params.benchmark_asset.clone();
        let report = self
            .fetcher
            .fetch_many(std::slice::from_ref(&benchmark), self.config.lookback_days)
            .await;
        let events = self.events.all();

        match self.index_engine.compute(&report.series, &events) {
            Ok(scores) => {
                info!(days = scores.len(), "Index refreshed");
                IndexRefresh {
                    scores,
                    warnings: report.warnings,
                    unavailable: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Index unavailable");
                IndexRefresh {
                    scores: Vec::new(),
                    warnings: report.warnings,
                    unavailable: Some(e.to_string()),
                }
            }
        }
    }

    /// Event study for a stored event; assets default to the tracked set
    #[instrument(skip(self, asset_ids), fields(on_close = true))]
    pub async fn run_event_study(
        &self,
        event_id: u64,
        asset_ids: Option<Vec<String>>,
    ) -> Result<(EventStudy, Vec<FetchWarning>)> {
        let event = self
            .events
            .get(event_id)
            .ok_or_else(|| eyre!("No policy event with id {}", event_id))?;
        let asset_ids = asset_ids.unwrap_or_else(|| self.config.tracked_assets.clone());
        let lookback = self.lookback_covering(event.date);

        let report = self.fetcher.fetch_many(&asset_ids, lookback).await;
        let study = self.study_engine.study(&event, &asset_ids, &report.series);
        Ok((study, report.warnings))
    }

    pub fn evaluate_portfolio(&self, allocation: &PortfolioAllocation) -> CoreResult<PortfolioMetrics> {
        self.portfolio.evaluate(allocation)
    }

    /// Correlations across the tracked assets and aggregate stablecoin supply
    #[instrument(skip(self), fields(on_close = true))]
    pub async fn market_overview(&self) -> MarketOverview {
        let (report, stablecoin_supply) = tokio::join!(
            self.fetcher.fetch_many(&self.config.tracked_assets, self.config.lookback_days),
            self.supply_source.fetch(self.config.lookback_days),
        );
        let series: BTreeMap<_, _> = report.series.into_iter().filter(|(_, s)| !s.is_empty()).collect();
        MarketOverview {
            correlations: correlation_matrix(&series),
            stablecoin_supply,
            warnings: report.warnings,
        }
    }

    /// Lookback long enough to reach the start of the event window
    fn lookback_covering(&self, event_date: NaiveDate) -> u32 {
        let window_start = event_date - chrono::Duration::days(self.study_engine.window_days());
        let days = (Utc::now().date_naive() - window_start).num_days() + 1;
        u32::try_from(days.max(0))
            .unwrap_or(u32::MAX)
            .max(self.config.lookback_days)
    }
}
