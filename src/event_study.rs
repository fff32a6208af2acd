pub mod engine;
pub mod types;

use std::collections::BTreeMap;

pub use engine::EventStudyEngine;
pub use types::{EventStudy, EventWindow};

use crate::constants::DEFAULT_CRISIS_WINDOW_DAYS;
use crate::error::CoreResult;
use crate::events::PolicyEvent;
use crate::market_data::types::AssetSeries;

/// Study one event over `±window_days` with the default crisis window
pub fn study(
    event: &PolicyEvent,
    asset_ids: &[String],
    series_by_asset: &BTreeMap<String, AssetSeries>,
    window_days: i64,
) -> CoreResult<EventStudy> {
    let engine = EventStudyEngine::new(window_days, DEFAULT_CRISIS_WINDOW_DAYS)?;
    Ok(engine.study(event, asset_ids, series_by_asset))
}
