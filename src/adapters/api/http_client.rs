//! Registry API adapter. Implements AccountApiPort over the JSON field API.
//!
//! The remote service allows a fixed number of requests per 30-second window;
//! the client throttles itself and callers never bypass it.

use crate::domain::DomainError;
use crate::ports::{AccountApiPort, ApiFactoryPort};
use reqwest::header::USER_AGENT;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Length of the remote rate window.
const RATE_WINDOW: Duration = Duration::from_secs(30);

/// Sliding-window request budget: at most `limit` requests per `window`.
/// Pure bookkeeping; the caller supplies `now` and performs the sleep.
pub struct RateWindow {
    window: Duration,
    limit: usize,
    stamps: VecDeque<Instant>,
}

impl RateWindow {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            window,
            limit: limit.max(1),
            stamps: VecDeque::new(),
        }
    }

    /// Try to reserve a request slot at `now`. `None` means go ahead (the slot
    /// is taken); `Some(wait)` means the window is full, retry after `wait`.
    pub fn reserve(&mut self, now: Instant) -> Option<Duration> {
        while let Some(&front) = self.stamps.front() {
            if now.duration_since(front) >= self.window {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
        let front = self.stamps.front().copied();
        match front {
            Some(front) if self.stamps.len() >= self.limit => {
                Some(self.window - now.duration_since(front))
            }
            _ => {
                self.stamps.push_back(now);
                None
            }
        }
    }

    pub fn clear(&mut self) {
        self.stamps.clear();
    }
}

/// Registry API client scoped to one run. Sends the run's composed identity
/// string as User-Agent on every request.
pub struct HttpAccountClient {
    client: reqwest::Client,
    base_url: String,
    identity: String,
    window: Mutex<RateWindow>,
}

impl HttpAccountClient {
    pub fn new(base_url: &str, identity: &str, rate_limit: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            identity: identity.to_string(),
            window: Mutex::new(RateWindow::new(rate_limit as usize, RATE_WINDOW)),
        }
    }

    /// Wait until the rate window has a free slot.
    async fn throttle(&self) {
        loop {
            let wait = self.window.lock().await.reserve(Instant::now());
            match wait {
                None => return,
                Some(delay) => {
                    debug!(delay_ms = delay.as_millis() as u64, "rate window full, waiting");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl AccountApiPort for HttpAccountClient {
    async fn request(
        &self,
        account: &str,
        fields: &[&str],
    ) -> Result<HashMap<String, String>, DomainError> {
        self.throttle().await;

        let url = format!("{}/accounts", self.base_url);
        let query = fields.join("+");
        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.identity)
            .query(&[("account", account), ("q", query.as_str())])
            .send()
            .await
            .map_err(|e| DomainError::Api(format!("request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DomainError::Api(format!("account {:?} not found", account)));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "unknown".to_string());
            return Err(DomainError::Api(format!("API error {}: {}", status, text)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DomainError::Api(format!("invalid response body: {}", e)))?;
        let object = body
            .as_object()
            .ok_or_else(|| DomainError::Api("expected a JSON object of fields".into()))?;

        let mut map = HashMap::new();
        for (key, value) in object {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            map.insert(key.clone(), rendered);
        }
        Ok(map)
    }

    async fn cleanup(&self) {
        self.window.lock().await.clear();
        debug!("registry client released");
    }
}

/// Builds one [`HttpAccountClient`] per run.
pub struct HttpApiFactory {
    base_url: String,
}

impl HttpApiFactory {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

impl ApiFactoryPort for HttpApiFactory {
    fn open(&self, identity: &str, rate_limit: u32) -> Arc<dyn AccountApiPort> {
        Arc::new(HttpAccountClient::new(&self.base_url, identity, rate_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_window_allows_up_to_limit() {
        let mut window = RateWindow::new(3, Duration::from_secs(30));
        let now = Instant::now();
        assert!(window.reserve(now).is_none());
        assert!(window.reserve(now).is_none());
        assert!(window.reserve(now).is_none());
        let wait = window.reserve(now).expect("fourth request must wait");
        assert_eq!(wait, Duration::from_secs(30));
    }

    #[test]
    fn rate_window_frees_slots_as_time_passes() {
        let mut window = RateWindow::new(2, Duration::from_secs(30));
        let start = Instant::now();
        assert!(window.reserve(start).is_none());
        assert!(window.reserve(start + Duration::from_secs(10)).is_none());

        let wait = window
            .reserve(start + Duration::from_secs(20))
            .expect("window full");
        assert_eq!(wait, Duration::from_secs(10));

        // First stamp has aged out; a slot is free again.
        assert!(window.reserve(start + Duration::from_secs(31)).is_none());
    }

    #[test]
    fn rate_window_limit_is_at_least_one() {
        let mut window = RateWindow::new(0, Duration::from_secs(30));
        assert!(window.reserve(Instant::now()).is_none());
    }
}
