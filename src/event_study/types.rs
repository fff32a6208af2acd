use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::events::PolicyEvent;

/// Cumulative return of one asset at one day offset from an event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventWindow {
    pub event_id: u64,
    pub asset_id: String,
    pub offset_day: i64,
    pub date: NaiveDate,
    /// Fraction relative to the event-date close, 0.0 at offset 0
    pub cumulative_return: f64,
}

/// Outcome of studying one event across several assets.
///
/// Assets that could not be studied are absent from `windows` and listed in
/// `unavailable` with the reason.
#[derive(Debug, Clone)]
pub struct EventStudy {
    pub event: PolicyEvent,
    pub window_days: i64,
    pub windows: BTreeMap<String, Vec<EventWindow>>,
    pub unavailable: BTreeMap<String, CoreError>,
    /// Post-event mean price over the crisis window vs the pre-event mean, as a fraction
    pub crisis_response: BTreeMap<String, f64>,
}

impl EventStudy {
    pub fn window_for(&self, asset_id: &str) -> Option<&[EventWindow]> {
        self.windows.get(asset_id).map(Vec::as_slice)
    }

    pub fn return_at(&self, asset_id: &str, offset_day: i64) -> Option<f64> {
        self.window_for(asset_id)?
            .iter()
            .find(|w| w.offset_day == offset_day)
            .map(|w| w.cumulative_return)
    }
}
