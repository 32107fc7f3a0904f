use crate::domain::model::LocationReport;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Short-lived per-venue store of extracted (pre-fallback) reports.
/// A zero TTL disables it entirely.
pub struct ResultCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, LocationReport)>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_seconds(ttl_seconds: u64) -> Self {
        Self::new(Duration::from_secs(ttl_seconds))
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub async fn get(&self, venue: &str) -> Option<LocationReport> {
        if !self.is_enabled() {
            return None;
        }

        let mut entries = self.entries.lock().await;
        match entries.get(venue) {
            Some((stored_at, report)) if stored_at.elapsed() < self.ttl => {
                tracing::debug!("{}: serving cached extraction", venue);
                Some(report.clone())
            }
            Some(_) => {
                entries.remove(venue);
                None
            }
            None => None,
        }
    }

    pub async fn put(&self, report: &LocationReport) {
        if !self.is_enabled() {
            return;
        }
        self.entries
            .lock()
            .await
            .insert(report.venue.clone(), (Instant::now(), report.clone()));
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}
