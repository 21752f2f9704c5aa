use anyhow::{Context, bail};
use reqwest::StatusCode;
use reqwest::blocking::{RequestBuilder, Response};
use reqwest::header::HeaderMap;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::warn;

const MAX_ATTEMPTS: u32 = 3;
const MAX_DELAY_SECS: u64 = 30;

pub fn send_with_retry<F>(build: F) -> anyhow::Result<Response>
where
    F: FnMut() -> anyhow::Result<RequestBuilder>,
{
    send_with_retry_allow_statuses(build, &[])
}

/// Sends a request, retrying rate-limited and unavailable responses. Any
/// status in `allowed` is handed back to the caller instead of failing.
pub fn send_with_retry_allow_statuses<F>(
    mut build: F,
    allowed: &[StatusCode],
) -> anyhow::Result<Response>
where
    F: FnMut() -> anyhow::Result<RequestBuilder>,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let response = build()?.send().context("send request")?;
        let status = response.status();
        if status.is_success() || allowed.contains(&status) {
            return Ok(response);
        }
        if is_retryable(status) && attempt < MAX_ATTEMPTS {
            let delay = retry_delay_from_headers(response.headers())
                .unwrap_or(Duration::from_secs(1))
                .min(Duration::from_secs(MAX_DELAY_SECS));
            warn!(status = %status, attempt, delay_secs = delay.as_secs(), "Retrying request");
            thread::sleep(delay);
            continue;
        }
        let url = response.url().clone();
        let body = response.text().unwrap_or_default();
        bail!("{status} from {url}: {}", api_message(&body));
    }
    bail!("request failed after retries");
}

fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
    )
}

fn retry_delay_from_headers(headers: &HeaderMap) -> Option<Duration> {
    if let Some(delay) = retry_after_seconds(headers) {
        return Some(Duration::from_secs(delay));
    }
    if let Some(delay) = ratelimit_reset_seconds(headers) {
        return Some(Duration::from_secs(delay));
    }
    None
}

fn retry_after_seconds(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
}

fn ratelimit_reset_seconds(headers: &HeaderMap) -> Option<u64> {
    let reset = headers
        .get("x-ratelimit-reset")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    if reset <= now {
        None
    } else {
        Some(reset - now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn retry_after_parses_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("5"));
        assert_eq!(retry_after_seconds(&headers), Some(5));
        assert_eq!(
            retry_delay_from_headers(&headers),
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn ratelimit_reset_uses_future_time() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-ratelimit-reset",
            HeaderValue::from_str(&(now + 10).to_string()).unwrap(),
        );
        let delay = ratelimit_reset_seconds(&headers).unwrap();
        assert!(delay > 0);

        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1"));
        assert_eq!(ratelimit_reset_seconds(&headers), None);
    }

    #[test]
    fn api_message_prefers_json_message() {
        assert_eq!(api_message(r#"{"message":"Not Found"}"#), "Not Found");
        assert_eq!(api_message("plain"), "plain");
    }

    #[test]
    fn only_rate_limits_retry() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
    }
}
