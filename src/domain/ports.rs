use crate::domain::model::VenueDescriptor;
use crate::utils::error::{FetchError, Result};
use async_trait::async_trait;

/// HTTP transport capability: returns the raw menu markup for one venue.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, venue: &VenueDescriptor) -> std::result::Result<String, FetchError>;
}

/// Sink for exported reports.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
