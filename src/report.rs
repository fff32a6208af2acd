use serde::Serialize;
use std::fmt::Write;

use crate::constants::display_symbol;
use crate::event_study::EventStudy;
use crate::events::PolicyEvent;
use crate::index::IndexScore;
use crate::market_data::correlation::CorrelationMatrix;
use crate::market_data::stablecoin_supply::StablecoinSupply;
use crate::portfolio::{PortfolioAllocation, PortfolioMetrics};

const SUMMARY_DELTA_DAYS: usize = 30;

/// Headline numbers for the latest index value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSummary {
    pub latest: IndexScore,
    /// Change against the score 30 rows earlier
    pub change_30d: Option<f64>,
    pub mean: f64,
    pub max: f64,
}

pub fn summarize_index(scores: &[IndexScore]) -> Option<IndexSummary> {
    let latest = scores.last()?.clone();
    let change_30d = scores
        .len()
        .checked_sub(SUMMARY_DELTA_DAYS + 1)
        .map(|i| latest.value - scores[i].value);
    let mean = scores.iter().map(|s| s.value).sum::<f64>() / scores.len() as f64;
    let max = scores.iter().map(|s| s.value).fold(f64::MIN, f64::max);
    Some(IndexSummary { latest, change_30d, mean, max })
}

pub fn percent(fraction: f64) -> String {
    if fraction.is_finite() {
        format!("{:+.2}%", fraction * 100.0)
    } else {
        "n/a".to_string()
    }
}

/// Last `rows` scores with their component breakdown
pub fn format_index_table(scores: &[IndexScore], rows: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<12} {:>7} {:>11} {:>11} {:>11}", "date", "index", "volatility", "volume", "events");
    for score in &scores[scores.len().saturating_sub(rows)..] {
        let _ = writeln!(
            out,
            "{:<12} {:>7.2} {:>11.2} {:>11.2} {:>11.2}",
            score.date.to_string(),
            score.value,
            score.components.volatility,
            score.components.volume_surge,
            score.components.event_intensity,
        );
    }
    out
}

pub fn format_index_summary(summary: &IndexSummary) -> String {
    let delta = summary
        .change_30d
        .map(|d| format!("{:+.2}", d))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "Corruption Index on {}: {:.2} (30d change {}, mean {:.2}, max {:.2})",
        summary.latest.date, summary.latest.value, delta, summary.mean, summary.max
    )
}

pub fn format_events(events: &[PolicyEvent]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>4} {:<12} {:<14} {:<16} {:>3}  description", "id", "date", "country", "type", "sev");
    for e in events {
        let country = if e.is_high_friction() { format!("{}*", e.country) } else { e.country.clone() };
        let _ = writeln!(
            out,
            "{:>4} {:<12} {:<14} {:<16} {:>3}  {}",
            e.id,
            e.date.to_string(),
            country,
            e.event_type.as_str(),
            e.severity,
            e.description
        );
    }
    if events.iter().any(PolicyEvent::is_high_friction) {
        let _ = writeln!(out, "* high-friction country");
    }
    out
}

/// Cumulative returns at a few headline offsets, one row per asset
pub fn format_event_study(study: &EventStudy, offsets: &[i64]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Event: {}", study.event.label());
    let _ = write!(out, "{:<8}", "asset");
    for offset in offsets {
        let _ = write!(out, " {:>9}", format!("t{:+}", offset));
    }
    let _ = writeln!(out, " {:>10}", "crisis");

    for asset_id in study.windows.keys() {
        let _ = write!(out, "{:<8}", display_symbol(asset_id));
        for offset in offsets {
            let cell = study
                .return_at(asset_id, *offset)
                .map(percent)
                .unwrap_or_else(|| "-".to_string());
            let _ = write!(out, " {:>9}", cell);
        }
        let crisis = study
            .crisis_response
            .get(asset_id)
            .map(|r| percent(*r))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, " {:>10}", crisis);
    }
    for (asset_id, reason) in &study.unavailable {
        let _ = writeln!(out, "{:<8} unavailable: {}", display_symbol(asset_id), reason);
    }
    out
}

pub fn format_portfolio(allocation: &PortfolioAllocation, metrics: &PortfolioMetrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<14} {:>8} {:>9} {:>10}", "class", "weight", "leverage", "exposure");
    for (class, position) in allocation.positions() {
        let exposure = metrics.effective_exposure.get(class).copied().unwrap_or(0.0);
        let _ = writeln!(
            out,
            "{:<14} {:>7.1}% {:>8.1}x {:>9.1}%",
            class.label(),
            position.weight_percent,
            position.leverage,
            exposure
        );
    }
    let _ = writeln!(out, "Expected return (base):   {}", percent(metrics.expected_return_base));
    let _ = writeln!(out, "Expected return (crisis): {}", percent(metrics.expected_return_crisis));
    let _ = writeln!(out, "Max drawdown (estimate):  {}", percent(metrics.max_drawdown));
    let _ = writeln!(out, "Gross leverage:           {:.2}x", metrics.gross_leverage);
    let _ = writeln!(out, "Confidence:               {:?} (static assumptions)", metrics.confidence);
    out
}

pub fn format_correlations(matrix: &CorrelationMatrix) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:<6}", "");
    for asset in &matrix.assets {
        let _ = write!(out, " {:>6}", display_symbol(asset));
    }
    let _ = writeln!(out);
    for (i, asset) in matrix.assets.iter().enumerate() {
        let _ = write!(out, "{:<6}", display_symbol(asset));
        for j in 0..matrix.assets.len() {
            let value = matrix.values[[i, j]];
            if value.is_nan() {
                let _ = write!(out, " {:>6}", "n/a");
            } else {
                let _ = write!(out, " {:>6.2}", value);
            }
        }
        let _ = writeln!(out);
    }
    out
}

pub fn format_supply(supply: &StablecoinSupply) -> String {
    let (Some(first), Some(last)) = (supply.points.first(), supply.points.last()) else {
        return format!("Stablecoin supply ({:?}): no data", supply.provenance);
    };
    let change = last.total_supply_usd / first.total_supply_usd - 1.0;
    format!(
        "Stablecoin supply ({:?}): ${:.1}B on {} ({} since {})",
        supply.provenance,
        last.total_supply_usd / 1e9,
        last.date,
        percent(change),
        first.date
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{ComponentScores, RawSignals};
    use chrono::NaiveDate;

    fn score(day: u32, value: f64) -> IndexScore {
        IndexScore {
            date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(day as i64),
            value,
            components: ComponentScores::uniform(value),
            raw: RawSignals { volatility: None, volume_zscore: None, severity_sum: 0.0 },
        }
    }

    #[test]
    fn summary_needs_thirty_one_rows_for_delta() {
        let short: Vec<_> = (0..30).map(|d| score(d, 40.0)).collect();
        assert_eq!(summarize_index(&short).unwrap().change_30d, None);

        let long: Vec<_> = (0..31).map(|d| score(d, d as f64)).collect();
        let summary = summarize_index(&long).unwrap();
        assert_eq!(summary.change_30d, Some(30.0));
        assert_eq!(summary.max, 30.0);
        assert_eq!(summary.mean, 15.0);
    }

    #[test]
    fn empty_scores_have_no_summary() {
        assert!(summarize_index(&[]).is_none());
    }

    #[test]
    fn percent_handles_non_finite() {
        assert_eq!(percent(0.5), "+50.00%");
        assert_eq!(percent(-0.485), "-48.50%");
        assert_eq!(percent(f64::NAN), "n/a");
    }

    #[test]
    fn event_table_flags_high_friction_countries() {
        let store = crate::events::EventStore::seeded();
        let table = format_events(&store.all());
        assert!(table.contains("Russia*"));
        assert!(!table.contains("USA*"));
        assert!(table.ends_with("* high-friction country\n"));
    }

    #[test]
    fn index_table_shows_last_rows_only() {
        let scores: Vec<_> = (0..5).map(|d| score(d, 10.0 * d as f64)).collect();
        let table = format_index_table(&scores, 2);
        assert_eq!(table.lines().count(), 3);
        assert!(table.contains("2023-01-05"));
        assert!(!table.contains("2023-01-03"));
    }
}
