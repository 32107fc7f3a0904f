use crate::config::toml_config::FetchConfig;
use crate::domain::model::VenueDescriptor;
use crate::domain::ports::PageFetcher;
use crate::utils::error::{FetchError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Fetches menu pages over one shared client, spacing out requests that
/// move from one venue to another.
pub struct HttpFetcher {
    client: Client,
    min_delay: Duration,
    last_request: Mutex<Option<(String, Instant)>>,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            min_delay: Duration::from_millis(config.min_delay_ms),
            last_request: Mutex::new(None),
        })
    }

    /// Waits out the inter-venue delay. The lock is held across the sleep so
    /// overlapping callers queue up instead of all firing at once.
    async fn pace(&self, venue_key: &str) {
        let mut last = self.last_request.lock().await;
        if let Some((previous, at)) = last.as_ref() {
            let elapsed = at.elapsed();
            if previous != venue_key && elapsed < self.min_delay {
                let wait = self.min_delay - elapsed;
                tracing::debug!("Waiting {:?} before fetching {}", wait, venue_key);
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some((venue_key.to_string(), Instant::now()));
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, venue: &VenueDescriptor) -> std::result::Result<String, FetchError> {
        self.pace(&venue.key).await;

        tracing::debug!("Fetching {} from {}", venue.key, venue.menu_source_ref);
        let response = self
            .client
            .get(&venue.menu_source_ref)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();
        tracing::debug!("{} responded with {}", venue.key, status);
        if !status.is_success() {
            return Err(FetchError::HttpError(status.as_u16()));
        }

        response.text().await.map_err(|e| FetchError::from_reqwest(&e))
    }
}
