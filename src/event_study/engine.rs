use chrono::Duration;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

use super::types::{EventStudy, EventWindow};
use crate::error::{CoreError, CoreResult};
use crate::events::PolicyEvent;
use crate::market_data::types::{AssetSeries, PricePoint};

#[derive(Debug, Clone, Copy)]
pub struct EventStudyEngine {
    window_days: i64,
    crisis_window_days: i64,
}

impl EventStudyEngine {
    pub fn new(window_days: i64, crisis_window_days: i64) -> CoreResult<Self> {
        if window_days < 1 {
            return Err(CoreError::validation("event study window must be at least 1 day"));
        }
        if crisis_window_days < 0 {
            return Err(CoreError::validation("crisis window must not be negative"));
        }
        Ok(Self {
            window_days,
            crisis_window_days,
        })
    }

    pub fn window_days(&self) -> i64 {
        self.window_days
    }

    /// Study `event` for each of `asset_ids`; one asset failing leaves the others intact
    #[instrument(skip_all, fields(event_id = event.id, event_date = %event.date, on_close = true))]
    pub fn study(
        &self,
        event: &PolicyEvent,
        asset_ids: &[String],
        series_by_asset: &BTreeMap<String, AssetSeries>,
    ) -> EventStudy {
        let mut study = EventStudy {
            event: event.clone(),
            window_days: self.window_days,
            windows: BTreeMap::new(),
            unavailable: BTreeMap::new(),
            crisis_response: BTreeMap::new(),
        };

        for asset_id in asset_ids {
            let Some(series) = series_by_asset.get(asset_id) else {
                warn!(asset_id = %asset_id, "No series supplied for asset");
                study
                    .unavailable
                    .insert(asset_id.clone(), CoreError::insufficient(asset_id.clone(), "no price series"));
                continue;
            };
            match self.study_asset(event, series) {
                Ok(windows) => {
                    if let Some(response) = self.crisis_response(event, series) {
                        study.crisis_response.insert(asset_id.clone(), response);
                    }
                    study.windows.insert(asset_id.clone(), windows);
                }
                Err(e) => {
                    warn!(asset_id = %asset_id, error = %e, "Event study unavailable for asset");
                    study.unavailable.insert(asset_id.clone(), e);
                }
            }
        }

        info!(
            studied = study.windows.len(),
            unavailable = study.unavailable.len(),
            "Event study complete"
        );
        study
    }

    /// Cumulative returns for offsets `-window..=+window`, anchored at the event-date close.
    ///
    /// Offsets without a price are left out rather than interpolated.
    pub fn study_asset(&self, event: &PolicyEvent, series: &AssetSeries) -> CoreResult<Vec<EventWindow>> {
        let points = self.valid_points(event, series);
        if points.len() < 2 {
            return Err(CoreError::insufficient(
                series.asset_id.clone(),
                format!("{} valid price points within ±{} days of {}", points.len(), self.window_days, event.date),
            ));
        }
        let anchor = points
            .iter()
            .find(|p| p.date == event.date)
            .map(|p| p.close_price)
            .ok_or_else(|| {
                CoreError::insufficient(
                    series.asset_id.clone(),
                    format!("no close price on event date {}", event.date),
                )
            })?;

        let windows: Vec<EventWindow> = points
            .iter()
            .map(|p| EventWindow {
                event_id: event.id,
                asset_id: series.asset_id.clone(),
                offset_day: (p.date - event.date).num_days(),
                date: p.date,
                cumulative_return: p.close_price / anchor - 1.0,
            })
            .collect();
        debug!(asset_id = %series.asset_id, offsets = windows.len(), "Event window extracted");
        Ok(windows)
    }

    /// Mean close over `[0, crisis_window]` against the mean close over the
    /// pre-event part of the window
    pub fn crisis_response(&self, event: &PolicyEvent, series: &AssetSeries) -> Option<f64> {
        let points = self.valid_points(event, series);
        let pre: Vec<f64> = points.iter().filter(|p| p.date < event.date).map(|p| p.close_price).collect();
        let crisis_end = event.date + Duration::days(self.crisis_window_days);
        let post: Vec<f64> = points
            .iter()
            .filter(|p| p.date >= event.date && p.date <= crisis_end)
            .map(|p| p.close_price)
            .collect();
        if pre.is_empty() || post.is_empty() {
            return None;
        }
        let pre_mean = pre.iter().sum::<f64>() / pre.len() as f64;
        let post_mean = post.iter().sum::<f64>() / post.len() as f64;
        Some(post_mean / pre_mean - 1.0)
    }

    fn valid_points(&self, event: &PolicyEvent, series: &AssetSeries) -> Vec<PricePoint> {
        let from = event.date - Duration::days(self.window_days);
        let to = event.date + Duration::days(self.window_days);
        series
            .between(from, to)
            .iter()
            .filter(|p| p.close_price.is_finite() && p.close_price > 0.0)
            .copied()
            .collect()
    }
}
