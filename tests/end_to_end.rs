use approx::assert_abs_diff_eq;
use chrono::{Duration, NaiveDate};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crypto_corruption_index::config::Config;
use crypto_corruption_index::dashboard::Dashboard;
use crypto_corruption_index::error::CoreError;
use crypto_corruption_index::event_study;
use crypto_corruption_index::events::{EventStore, EventType, NewPolicyEvent, PolicyEvent};
use crypto_corruption_index::index::{self, IndexParams, IndexWeights};
use crypto_corruption_index::market_data::types::{AssetSeries, PricePoint};
use crypto_corruption_index::portfolio::PortfolioAllocation;

fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + Duration::days(n - 1)
}

/// Ten days of BTC: flat at 100 through the event on day 5, then 150
fn btc_series() -> AssetSeries {
    let points = (1..=10)
        .map(|n| PricePoint {
            date: day(n),
            close_price: if n <= 5 { 100.0 } else { 150.0 },
            volume: 1_000.0,
        })
        .collect();
    AssetSeries::from_points("bitcoin", points)
}

fn flat_series(asset_id: &str) -> AssetSeries {
    let points = (1..=10)
        .map(|n| PricePoint { date: day(n), close_price: 42.0, volume: 10.0 })
        .collect();
    AssetSeries::from_points(asset_id, points)
}

fn severe_event() -> PolicyEvent {
    PolicyEvent {
        id: 1,
        date: day(5),
        country: "Testland".to_string(),
        event_type: EventType::CapitalControl,
        severity: 10,
        description: "Withdrawal limits".to_string(),
    }
}

#[test]
fn index_reacts_to_event_over_ten_days() {
    let series = BTreeMap::from([("bitcoin".to_string(), btc_series())]);
    let scores = index::compute(&series, &[severe_event()], IndexWeights::default(), IndexParams::default()).unwrap();

    assert_eq!(scores.len(), 10);
    // neither rolling window is full, so volatility and volume stay neutral
    assert_eq!(scores[0].value, 30.0);
    assert_eq!(scores[3].value, 30.0);
    for score in &scores[4..] {
        assert_eq!(score.components.event_intensity, 50.0);
        assert_eq!(score.value, 50.0);
    }
}

#[test]
fn event_study_rebases_at_event_date() {
    let series = BTreeMap::from([("bitcoin".to_string(), btc_series())]);
    let study = event_study::study(&severe_event(), &["bitcoin".to_string()], &series, 5).unwrap();

    assert_eq!(study.return_at("bitcoin", -4), Some(0.0));
    assert_eq!(study.return_at("bitcoin", 0), Some(0.0));
    assert_eq!(study.return_at("bitcoin", 1), Some(0.5));
    assert_eq!(study.return_at("bitcoin", 5), Some(0.5));
    // day -5 is before the series starts
    assert_eq!(study.return_at("bitcoin", -5), None);
    assert_eq!(study.window_for("bitcoin").unwrap().len(), 10);

    // (100 + 5 * 150) / 6 against a pre-event mean of 100
    assert_abs_diff_eq!(study.crisis_response["bitcoin"], 850.0 / 6.0 / 100.0 - 1.0, epsilon = 1e-12);
}

#[test]
fn flat_prices_give_zero_cumulative_return() {
    let series = BTreeMap::from([("tether".to_string(), flat_series("tether"))]);
    let study = event_study::study(&severe_event(), &["tether".to_string()], &series, 30).unwrap();
    let windows = study.window_for("tether").unwrap();
    assert_eq!(windows.len(), 10);
    assert!(windows.iter().all(|w| w.cumulative_return == 0.0));
}

#[test]
fn one_failing_asset_leaves_the_others_intact() {
    let series = BTreeMap::from([
        ("bitcoin".to_string(), btc_series()),
        ("monero".to_string(), AssetSeries::empty("monero")),
    ]);
    let assets = vec!["bitcoin".to_string(), "monero".to_string(), "zcash".to_string()];
    let study = event_study::study(&severe_event(), &assets, &series, 30).unwrap();

    assert_eq!(study.windows.len(), 1);
    assert!(study.window_for("bitcoin").is_some());
    assert!(matches!(study.unavailable["monero"], CoreError::InsufficientData { .. }));
    assert!(study.unavailable.contains_key("zcash"));
}

fn chart_body(series: &AssetSeries) -> Value {
    let ms = |d: NaiveDate| d.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis();
    let prices: Vec<Value> = series.points().iter().map(|p| json!([ms(p.date), p.close_price])).collect();
    let volumes: Vec<Value> = series.points().iter().map(|p| json!([ms(p.date), p.volume])).collect();
    json!({ "prices": prices, "total_volumes": volumes })
}

async fn dashboard_with(server: &MockServer) -> Dashboard {
    let mut config = Config::with_base_url(server.uri());
    config.defillama_base_url = server.uri();
    config.tracked_assets = vec!["bitcoin".to_string(), "monero".to_string()];
    config.event_study_window_days = 5;

    let store = EventStore::new();
    store
        .add(NewPolicyEvent::new("2023-01-05", "Testland", EventType::CapitalControl, 10, "Withdrawal limits"))
        .unwrap();
    Dashboard::new(config, Arc::new(store)).unwrap()
}

#[tokio::test]
async fn dashboard_refreshes_index_from_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body(&btc_series())))
        .mount(&server)
        .await;

    let refresh = dashboard_with(&server).await.refresh_index().await;
    assert!(refresh.unavailable.is_none());
    assert!(refresh.warnings.is_empty());
    assert_eq!(refresh.scores.len(), 10);
    assert_eq!(refresh.scores[9].value, 50.0);
}

#[tokio::test]
async fn dashboard_event_study_survives_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body(&btc_series())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/coins/monero/market_chart"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dashboard = dashboard_with(&server).await;
    let (study, warnings) = dashboard.run_event_study(1, None).await.unwrap();

    assert_eq!(warnings.len(), 1);
    assert_eq!(study.return_at("bitcoin", 1), Some(0.5));
    assert!(study.unavailable.contains_key("monero"));

    assert!(dashboard.run_event_study(99, None).await.is_err());
}

#[tokio::test]
async fn dashboard_evaluates_default_portfolio() {
    let server = MockServer::start().await;
    let dashboard = dashboard_with(&server).await;
    let metrics = dashboard.evaluate_portfolio(&PortfolioAllocation::default_allocation()).unwrap();
    assert_abs_diff_eq!(metrics.expected_return_base, 0.219, epsilon = 1e-12);
}
