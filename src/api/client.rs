use std::future::Future;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::api::types::{SearchResult, Series, SeriesId};
use crate::api::{LicenseAck, RemoteClient};
use crate::config::ApiConfig;
use crate::error::ApiError;

const FETCH_FAILED: &str = "Failed to fetch data";
const LICENSE_FAILED: &str = "Failed to process license request";

/// HTTP client for the series metadata API and the license server
pub struct SeenitClient {
    client: Client,
    metadata_url: String,
    license_url: String,
}

impl SeenitClient {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            client: Client::new(),
            metadata_url: config.metadata_url.trim_end_matches('/').to_string(),
            license_url: config.license_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_series(&self, id: SeriesId) -> Result<Series, ApiError> {
        let url = format!("{}/shows/{}?embed=seasons", self.metadata_url, id);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::Http(response.status().as_u16()));
        }

        response.json().await.map_err(|e| {
            tracing::debug!(id, error = %e, "unreadable series response");
            ApiError::Request(FETCH_FAILED.to_string())
        })
    }

    async fn search_shows(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        let url = format!(
            "{}/search/shows?q={}",
            self.metadata_url,
            urlencoding::encode(query)
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::Http(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// POST `{ licenseKey }` to one of the license endpoints
    async fn license_request(&self, endpoint: &str, key: &str) -> Result<LicenseAck, ApiError> {
        let url = format!("{}/{}", self.license_url, endpoint);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "licenseKey": key }))
            .send()
            .await?;

        license_outcome(response).await
    }
}

/// Server error text wins over the status line when the body carries one
async fn license_outcome(response: Response) -> Result<LicenseAck, ApiError> {
    let status = response.status();
    let body = response.json::<LicenseResponse>().await.ok();

    match (status.is_success(), body) {
        (true, Some(LicenseResponse::Success { message })) => Ok(LicenseAck { message }),
        (_, Some(LicenseResponse::Failure { error })) if !error.is_empty() => {
            Err(ApiError::Server(error))
        }
        (false, _) => Err(ApiError::Http(status.as_u16())),
        (true, _) => Err(ApiError::Request(LICENSE_FAILED.to_string())),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LicenseResponse {
    Success { message: String },
    Failure { error: String },
}

/// Race a request against its cancellation token
async fn cancellable<T, F>(cancel: &CancellationToken, request: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ApiError::Cancelled),
        result = request => result,
    }
}

#[async_trait]
impl RemoteClient for SeenitClient {
    async fn fetch_series_metadata(
        &self,
        id: SeriesId,
        cancel: &CancellationToken,
    ) -> Result<Series, ApiError> {
        tracing::debug!(id, "fetching series metadata");
        cancellable(cancel, self.get_series(id)).await
    }

    async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ApiError> {
        tracing::debug!(query, "searching shows");
        cancellable(cancel, self.search_shows(query)).await
    }

    async fn activate_license(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<LicenseAck, ApiError> {
        cancellable(cancel, self.license_request("activate-license", key)).await
    }

    async fn check_license(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<LicenseAck, ApiError> {
        cancellable(cancel, self.license_request("check-license", key)).await
    }
}
