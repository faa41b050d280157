mod cancel;
mod client;
#[cfg(test)]
pub mod fake;
mod types;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use cancel::CancelSlot;
pub use client::SeenitClient;
pub use types::{Embedded, Image, Rating, SearchResult, Season, SeasonId, Series, SeriesId, SeriesStatus};

use crate::error::ApiError;

/// Success payload of the license endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseAck {
    pub message: String,
}

/// Remote metadata and license calls. Every call settles with
/// `ApiError::Cancelled` once its token is cancelled.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Series metadata with embedded seasons
    async fn fetch_series_metadata(
        &self,
        id: SeriesId,
        cancel: &CancellationToken,
    ) -> Result<Series, ApiError>;

    async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ApiError>;

    async fn activate_license(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<LicenseAck, ApiError>;

    async fn check_license(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<LicenseAck, ApiError>;
}
