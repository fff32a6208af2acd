use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crypto_corruption_index::config::Config;
use crypto_corruption_index::error::CoreError;
use crypto_corruption_index::market_data::MarketDataFetcher;
use crypto_corruption_index::market_data::stablecoin_supply::{Provenance, StablecoinSupplySource};

const DAY_MS: i64 = 86_400_000;
// 2023-01-01T00:00:00Z
const JAN_1_MS: i64 = 1_672_531_200_000;

fn chart_body(days: i64) -> Value {
    let prices: Vec<Value> = (0..days).map(|d| json!([JAN_1_MS + d * DAY_MS, 100.0 + d as f64])).collect();
    let volumes: Vec<Value> = (0..days).map(|d| json!([JAN_1_MS + d * DAY_MS, 1_000.0])).collect();
    json!({ "prices": prices, "market_caps": [], "total_volumes": volumes })
}

async fn fetcher_for(server: &MockServer) -> MarketDataFetcher {
    let mut config = Config::with_base_url(server.uri());
    config.defillama_base_url = server.uri();
    MarketDataFetcher::new(&config).unwrap()
}

#[tokio::test]
async fn second_fetch_within_ttl_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .and(query_param("vs_currency", "usd"))
        .and(query_param("days", "30"))
        .and(query_param("interval", "daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body(5)))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server).await;
    let first = fetcher.fetch("bitcoin", 30).await.unwrap();
    let second = fetcher.fetch("bitcoin", 30).await.unwrap();

    assert_eq!(first.len(), 5);
    assert_eq!(first, second);
    assert_eq!(first.points()[4].close_price, 104.0);
    assert_eq!(fetcher.cached_series().await, 1);
}

#[tokio::test]
async fn different_lookback_is_a_separate_cache_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body(3)))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server).await;
    fetcher.fetch("bitcoin", 30).await.unwrap();
    fetcher.fetch("bitcoin", 90).await.unwrap();
    assert_eq!(fetcher.cached_series().await, 2);
}

#[tokio::test]
async fn rate_limited_response_is_data_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server).await;
    let err = fetcher.fetch("bitcoin", 30).await.unwrap_err();
    match err {
        CoreError::DataUnavailable { asset_id, reason } => {
            assert_eq!(asset_id, "bitcoin");
            assert!(reason.contains("429"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_data_unavailable_and_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/ethereum/market_chart"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server).await;
    for _ in 0..2 {
        let err = fetcher.fetch("ethereum", 30).await.unwrap_err();
        assert!(matches!(err, CoreError::DataUnavailable { .. }));
    }
    assert_eq!(fetcher.cached_series().await, 0);
}

#[tokio::test]
async fn stalled_response_times_out_as_data_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body(5)).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = Config::with_base_url(server.uri());
    config.http_timeout = Duration::from_secs(1);
    let fetcher = MarketDataFetcher::new(&config).unwrap();

    let err = fetcher.fetch("bitcoin", 30).await.unwrap_err();
    assert!(matches!(err, CoreError::DataUnavailable { ref asset_id, .. } if asset_id == "bitcoin"));
    assert_eq!(fetcher.cached_series().await, 0);
}

#[tokio::test]
async fn empty_payload_is_data_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/monero/market_chart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "prices": [], "total_volumes": [] })))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server).await;
    let err = fetcher.fetch("monero", 30).await.unwrap_err();
    assert!(matches!(err, CoreError::DataUnavailable { .. }));
}

#[tokio::test]
async fn fetch_many_substitutes_empty_series_for_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/bitcoin/market_chart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body(4)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/coins/monero/market_chart"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server).await;
    let assets = vec!["bitcoin".to_string(), "monero".to_string()];
    let report = fetcher.fetch_many(&assets, 30).await;

    assert!(!report.is_complete());
    assert_eq!(report.series.len(), 2);
    assert_eq!(report.series["bitcoin"].len(), 4);
    assert!(report.series["monero"].is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].asset_id, "monero");
}

#[tokio::test]
async fn stablecoin_supply_reads_live_chart() {
    let server = MockServer::start().await;
    let today = chrono::Utc::now().date_naive();
    let entries: Vec<Value> = (0..3)
        .map(|d| {
            let date = today - chrono::Duration::days(2 - d);
            let ts = date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
            json!({ "date": ts.to_string(), "totalCirculatingUSD": { "peggedUSD": 1.0e11 + d as f64 * 1.0e9 } })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/stablecoincharts/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(entries)))
        .mount(&server)
        .await;

    let mut config = Config::with_base_url(server.uri());
    config.defillama_base_url = server.uri();
    let supply = StablecoinSupplySource::new(&config).unwrap().fetch(30).await;

    assert_eq!(supply.provenance, Provenance::Live);
    assert_eq!(supply.points.len(), 3);
    assert_eq!(supply.points[2].total_supply_usd, 1.02e11);
}

#[tokio::test]
async fn stablecoin_supply_falls_back_to_simulation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stablecoincharts/all"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let mut config = Config::with_base_url(server.uri());
    config.defillama_base_url = server.uri();
    let supply = StablecoinSupplySource::new(&config).unwrap().fetch(30).await;

    assert_eq!(supply.provenance, Provenance::Simulated);
    assert_eq!(supply.points.len(), 30);
}
