use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use reqwest::{Response, StatusCode};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Tracks the primary rate limit from `x-ratelimit-*` response headers and
/// suspends the sequential fetch loop while the quota is exhausted.
pub struct RateLimiter {
    state: Mutex<RateLimitState>,
}

struct RateLimitState {
    remaining: u64,
    reset_at: Option<Instant>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RateLimitState {
                remaining: 5000,
                reset_at: None,
            }),
        }
    }

    /// Suspend until the recorded reset when the quota is already known to be
    /// exhausted, so the next request is not wasted on a 403.
    pub async fn wait(&self) {
        let wait_duration = {
            let state = self.state.lock().await;
            match (state.remaining, state.reset_at) {
                (0, Some(reset_at)) => {
                    let now = Instant::now();
                    (reset_at > now).then(|| reset_at - now)
                }
                _ => None,
            }
        };

        if let Some(wait_duration) = wait_duration {
            tracing::info!("Rate limit exhausted, waiting {:?}", wait_duration);
            sleep(wait_duration).await;
        }
    }

    /// Record the rate-limit headers of a response.
    pub async fn observe(&self, response: &Response) {
        let Some(remaining) = header_u64(response, "x-ratelimit-remaining") else {
            return;
        };

        let mut state = self.state.lock().await;
        state.remaining = remaining;
        state.reset_at = header_u64(response, "x-ratelimit-reset").and_then(instant_at_epoch);
    }

    /// Whether a response is the service telling us to back off rather than a
    /// real permission denial. GitHub answers 403 for both.
    pub fn is_rate_limited(response: &Response) -> bool {
        let status = response.status();
        if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
            return false;
        }
        response.headers().contains_key("retry-after")
            || header_u64(response, "x-ratelimit-remaining") == Some(0)
    }

    /// How long a rate-limited response asks us to back off: `Retry-After`,
    /// else time to the advertised reset, else one minute.
    pub fn retry_delay(response: &Response) -> Duration {
        if let Some(secs) = header_u64(response, "retry-after") {
            return Duration::from_secs(secs.max(1));
        }
        header_u64(response, "x-ratelimit-reset")
            .and_then(instant_at_epoch)
            .map(|reset_at| reset_at.saturating_duration_since(Instant::now()))
            .filter(|d| !d.is_zero())
            .unwrap_or(Duration::from_secs(60))
    }

    /// Backoff for a rate-limit signal that arrived without usable headers
    /// (GraphQL reports it inside a 200 body).
    pub async fn delay_until_reset(&self) -> Duration {
        let state = self.state.lock().await;
        match state.reset_at {
            Some(reset_at) if reset_at > Instant::now() => reset_at - Instant::now(),
            _ => Duration::from_secs(60),
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn header_u64(response: &Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn instant_at_epoch(epoch_secs: u64) -> Option<Instant> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
    (epoch_secs > now).then(|| Instant::now() + Duration::from_secs(epoch_secs - now))
}
