use governor::{DefaultDirectRateLimiter, Quota};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use nonzero_ext::*;

/// Settings for a rate limited API client
#[derive(Debug, Clone, Copy)]
pub struct HttpClientSettings {
    pub timeout: Duration,
    pub requests_per_minute: u32,
    pub max_retries: u32,
}

struct ApiRateLimiter {
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl reqwest_ratelimit::RateLimiter for ApiRateLimiter {
    async fn acquire_permit(&self) {
        self.rate_limiter.until_ready().await;
    }
}

/// Build a client with request timeout, optional transient retries and a
/// per-minute request quota.
///
/// With `max_retries == 0` every request is attempted exactly once.
pub fn build_http_client(settings: HttpClientSettings) -> reqwest::Result<ClientWithMiddleware> {
    let reqwest_client = reqwest::Client::builder()
        .timeout(settings.timeout)
        .build()?;

    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(Duration::from_millis(500), Duration::from_millis(1000))
        .build_with_max_retries(settings.max_retries);

    let per_minute = NonZeroU32::new(settings.requests_per_minute).unwrap_or(nonzero!(1u32));
    let rate_limiter = ApiRateLimiter {
        rate_limiter: Arc::new(DefaultDirectRateLimiter::direct(Quota::per_minute(per_minute))),
    };

    Ok(ClientBuilder::new(reqwest_client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .with(reqwest_ratelimit::all(rate_limiter))
        .build())
}
