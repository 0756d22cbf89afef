//! Rate-limited GET with bounded 429 backoff
//!
//! Every attempt passes through the shared [`RateGate`]. A 429 response is
//! retried after `Retry-After` seconds (or the configured fallback delay) up
//! to `max_retries` times; every other response is handed back as-is.

use super::rate_limiter::RateGate;
use crate::error::FetchError;
use ralert_common::{CheckerConfig, Result};
use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct HttpTransport {
    http_client: Client,
    gate: Arc<RateGate>,
    max_retries: u32,
    retry_fallback: Duration,
    max_retry_after: Duration,
}

impl HttpTransport {
    pub fn new(config: &CheckerConfig, gate: Arc<RateGate>) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http_client,
            gate,
            max_retries: config.max_retries,
            retry_fallback: config.retry_fallback(),
            max_retry_after: config.max_retry_after(),
        })
    }

    pub fn gate(&self) -> &Arc<RateGate> {
        &self.gate
    }

    /// GET `url`, retrying on 429
    ///
    /// Returns the first non-429 response regardless of status.
    pub async fn get(&self, url: &str, accept: Option<&str>) -> std::result::Result<Response, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            self.gate.wait().await;

            let mut request = self.http_client.get(url);
            if let Some(accept) = accept {
                request = request.header(ACCEPT, accept);
            }

            debug!(url = %url, attempt = attempt, "Outbound request");
            let response = request.send().await?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            if attempt >= self.max_retries {
                warn!(url = %url, attempts = attempt + 1, "Rate limited, giving up");
                return Err(FetchError::RateLimited(attempt + 1));
            }

            let delay = retry_after(response.headers(), self.max_retry_after)
                .unwrap_or(self.retry_fallback);
            debug!(url = %url, delay_ms = delay.as_millis() as u64, "HTTP 429, backing off");
            sleep(delay).await;
            attempt += 1;
        }
    }
}

/// `Retry-After` in (possibly fractional) seconds, clamped to `max`
///
/// HTTP-date values and garbage fall back to the default delay.
fn retry_after(headers: &HeaderMap, max: Duration) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?;
    let seconds: f64 = raw.trim().parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    // Clamp before converting: huge values overflow Duration
    Some(Duration::from_secs_f64(seconds.min(max.as_secs_f64())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    const MAX: Duration = Duration::from_secs(60);

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_retry_after_seconds() {
        assert_eq!(retry_after(&headers("2"), MAX), Some(Duration::from_secs(2)));
        assert_eq!(retry_after(&headers("0.5"), MAX), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_retry_after_clamped() {
        assert_eq!(retry_after(&headers("3600"), MAX), Some(MAX));
    }

    #[test]
    fn test_retry_after_beyond_duration_range_is_clamped() {
        assert_eq!(retry_after(&headers("1e30"), MAX), Some(MAX));
        assert_eq!(retry_after(&headers("1e300"), MAX), Some(MAX));
        assert_eq!(
            retry_after(&headers("1e30"), Duration::from_millis(20)),
            Some(Duration::from_millis(20))
        );
    }

    #[test]
    fn test_retry_after_unparseable() {
        assert_eq!(retry_after(&headers("Wed, 21 Oct 2015 07:28:00 GMT"), MAX), None);
        assert_eq!(retry_after(&headers("-1"), MAX), None);
        assert_eq!(retry_after(&headers("inf"), MAX), None);
        assert_eq!(retry_after(&HeaderMap::new(), MAX), None);
    }

    #[test]
    fn test_transport_creation() {
        let gate = Arc::new(RateGate::new(Duration::from_millis(100)));
        assert!(HttpTransport::new(&CheckerConfig::default(), gate).is_ok());
    }
}
