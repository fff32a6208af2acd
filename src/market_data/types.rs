use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily observation for one asset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close_price: f64,
    pub volume: f64,
}

/// Date-ordered daily series for a single asset.
///
/// Dates are strictly increasing and unique. A calendar day with no row is
/// simply absent; nothing is zero-filled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssetSeries {
    pub asset_id: String,
    points: Vec<PricePoint>,
}

impl AssetSeries {
    pub fn empty(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            points: Vec::new(),
        }
    }

    /// Build from unordered points; on duplicate dates the later point wins
    pub fn from_points(asset_id: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        // Stable sort keeps input order among equal dates, so the last duplicate is kept
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self {
            asset_id: asset_id.into(),
            points: deduped,
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn point_on(&self, date: NaiveDate) -> Option<&PricePoint> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| &self.points[i])
    }

    pub fn price_on(&self, date: NaiveDate) -> Option<f64> {
        self.point_on(date).map(|p| p.close_price)
    }

    /// Points with `from <= date <= to`
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> &[PricePoint] {
        let start = self.points.partition_point(|p| p.date < from);
        let end = self.points.partition_point(|p| p.date <= to);
        if start >= end { &[] } else { &self.points[start..end] }
    }

    /// Simple return for each row relative to the previous row.
    ///
    /// Index `i` holds the return into row `i`; row 0 and rows where either
    /// price is non-positive have no return.
    pub fn daily_returns(&self) -> Vec<Option<f64>> {
        let mut returns = Vec::with_capacity(self.points.len());
        for i in 0..self.points.len() {
            if i == 0 {
                returns.push(None);
                continue;
            }
            let p0 = self.points[i - 1].close_price;
            let p1 = self.points[i].close_price;
            if p0 > 0.0 && p1 > 0.0 && p0.is_finite() && p1.is_finite() {
                returns.push(Some(p1 / p0 - 1.0));
            } else {
                returns.push(None);
            }
        }
        returns
    }
}
