//! Scripted remote client for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::api::{
    Embedded, LicenseAck, Rating, RemoteClient, SearchResult, Season, SeasonId, Series, SeriesId,
    SeriesStatus,
};
use crate::error::ApiError;

/// Build series metadata with `(season id, episode order)` pairs
pub fn series(id: SeriesId, seasons: &[(SeasonId, Option<u32>)]) -> Series {
    series_with_status(id, SeriesStatus::Running, seasons)
}

pub fn series_with_status(
    id: SeriesId,
    status: SeriesStatus,
    seasons: &[(SeasonId, Option<u32>)],
) -> Series {
    Series {
        id,
        name: format!("Series {}", id),
        status,
        url: None,
        language: Some("English".to_string()),
        genres: vec!["Drama".to_string()],
        premiered: Some("2011-04-17".to_string()),
        ended: None,
        rating: Rating { average: Some(8.1) },
        image: None,
        summary: None,
        embedded: Some(Embedded {
            seasons: seasons
                .iter()
                .enumerate()
                .map(|(i, &(season_id, episode_order))| Season {
                    id: season_id,
                    number: i as u32 + 1,
                    name: None,
                    episode_order,
                    premiere_date: None,
                    end_date: None,
                    image: None,
                    extra: Default::default(),
                })
                .collect(),
            extra: Default::default(),
        }),
        extra: Default::default(),
    }
}

#[derive(Default)]
pub struct FakeClient {
    series: Mutex<HashMap<SeriesId, Series>>,
    search_results: Mutex<Option<Vec<SearchResult>>>,
    license_reply: Mutex<Option<Result<String, String>>>,
    failure: Mutex<Option<String>>,
    /// Number of upcoming calls that hang until cancelled
    held: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_series(&self, series: Series) {
        self.series.lock().unwrap().insert(series.id, series);
    }

    pub fn set_search_results(&self, results: Option<Vec<SearchResult>>) {
        *self.search_results.lock().unwrap() = results;
    }

    pub fn set_license_reply(&self, reply: Result<&str, &str>) {
        *self.license_reply.lock().unwrap() =
            Some(reply.map(String::from).map_err(String::from));
    }

    pub fn fail_with(&self, message: Option<&str>) {
        *self.failure.lock().unwrap() = message.map(String::from);
    }

    pub fn hold_next(&self, calls: usize) {
        self.held.store(calls, Ordering::SeqCst);
    }

    async fn gate(&self, cancel: &CancellationToken) -> Result<(), ApiError> {
        let held = self
            .held
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if held {
            cancel.cancelled().await;
        }

        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(ApiError::Request(message)),
            None => Ok(()),
        }
    }

    async fn license(&self, cancel: &CancellationToken) -> Result<LicenseAck, ApiError> {
        self.gate(cancel).await?;

        match self.license_reply.lock().unwrap().clone() {
            Some(Ok(message)) => Ok(LicenseAck { message }),
            Some(Err(error)) => Err(ApiError::Server(error)),
            None => Err(ApiError::Http(500)),
        }
    }
}

#[async_trait]
impl RemoteClient for FakeClient {
    async fn fetch_series_metadata(
        &self,
        id: SeriesId,
        cancel: &CancellationToken,
    ) -> Result<Series, ApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.gate(cancel).await?;

        self.series
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(ApiError::Http(404))
    }

    async fn search(
        &self,
        _query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, ApiError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.gate(cancel).await?;

        self.search_results
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::Request("Network Error".to_string()))
    }

    async fn activate_license(
        &self,
        _key: &str,
        cancel: &CancellationToken,
    ) -> Result<LicenseAck, ApiError> {
        self.license(cancel).await
    }

    async fn check_license(
        &self,
        _key: &str,
        cancel: &CancellationToken,
    ) -> Result<LicenseAck, ApiError> {
        self.license(cancel).await
    }
}
