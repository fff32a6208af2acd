pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod event_study;
pub mod events;
pub mod http_client;
pub mod index;
pub mod logging;
pub mod market_data;
pub mod portfolio;
pub mod report;
