//! The persisted series tracking store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::{RemoteClient, SeasonId, Series, SeriesId};
use crate::config::UiConfig;
use crate::error::{ApiError, StorageError};
use crate::storage::{StateStorage, SERIES_STORAGE_NAME};
use crate::store::persist::{nullable, Persister};
use crate::tracking::{build_tracking_series, reconcile_tracking_series, TrackingSeries};

/// The six persisted fields, serialized as the `state` of the backup file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedSeries {
    /// Tracked series in tracking order
    #[serde(deserialize_with = "nullable")]
    pub series_data: Vec<Series>,
    #[serde(deserialize_with = "nullable")]
    pub active_series_id: Option<SeriesId>,
    pub tracking_series_map: BTreeMap<SeriesId, bool>,
    pub favorites_series_map: BTreeMap<SeriesId, bool>,
    #[serde(deserialize_with = "nullable")]
    pub tracking_series_data: BTreeMap<SeriesId, TrackingSeries>,
    pub is_reward_shown_map: BTreeMap<SeriesId, bool>,
}

impl TrackedSeries {
    pub fn series(&self, id: SeriesId) -> Option<&Series> {
        self.series_data.iter().find(|series| series.id == id)
    }

    pub fn is_tracked(&self, id: SeriesId) -> bool {
        self.tracking_series_map.get(&id).copied().unwrap_or(false)
    }

    pub fn is_favorite(&self, id: SeriesId) -> bool {
        self.favorites_series_map.get(&id).copied().unwrap_or(false)
    }

    pub fn active_series(&self) -> Option<&Series> {
        self.active_series_id.and_then(|id| self.series(id))
    }
}

/// Full store state: persisted fields plus transient request flags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesState {
    pub data: TrackedSeries,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub error: Option<String>,
}

/// Episode address for `toggle_episode_watched`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleEpisodeWatched {
    pub series_id: SeriesId,
    pub season_id: SeasonId,
    pub episode_id: String,
    pub is_watched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAllWatchedMode {
    /// Mark every unwatched episode watched, keeping existing timestamps
    Complete,
    /// Mark every episode unwatched
    Reset,
}

/// Minimum durations applied before a fetched result is committed
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesStoreOptions {
    pub fetch_delay: Duration,
    pub refresh_delay: Duration,
}

impl From<&UiConfig> for SeriesStoreOptions {
    fn from(ui: &UiConfig) -> Self {
        Self {
            fetch_delay: ui.fetch_delay(),
            refresh_delay: ui.refresh_delay(),
        }
    }
}

pub struct SeriesStore {
    state: watch::Sender<SeriesState>,
    persister: Persister,
    client: Arc<dyn RemoteClient>,
    options: SeriesStoreOptions,
}

impl SeriesStore {
    /// Create the store and rehydrate it from storage
    pub async fn open(
        storage: Arc<dyn StateStorage>,
        client: Arc<dyn RemoteClient>,
        options: SeriesStoreOptions,
    ) -> Self {
        let (state, _) = watch::channel(SeriesState::default());
        let store = Self {
            state,
            persister: Persister::spawn(storage, SERIES_STORAGE_NAME),
            client,
            options,
        };
        store.rehydrate().await;
        store
    }

    pub fn state(&self) -> SeriesState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SeriesState> {
        self.state.subscribe()
    }

    pub fn tracking(&self, id: SeriesId) -> Option<TrackingSeries> {
        self.state.borrow().data.tracking_series_data.get(&id).cloned()
    }

    /// Produce the next state from a copy of the current one and publish
    /// it; persisted fields are queued for storage when they changed.
    fn set(&self, action: &str, update: impl FnOnce(&mut SeriesState)) {
        self.state.send_modify(|state| {
            let mut next = state.clone();
            update(&mut next);

            if next.data != state.data {
                self.persister.persist(&next.data);
            }

            tracing::debug!(action, "series store");
            *state = next;
        });
    }

    /// Replace the persisted fields with what storage holds now
    pub async fn rehydrate(&self) -> bool {
        let Some(data) = self.persister.load::<TrackedSeries>().await else {
            return false;
        };

        self.state.send_modify(|state| state.data = data);
        tracing::debug!(action = "rehydrate", "series store");
        true
    }

    pub async fn flush(&self) {
        self.persister.flush().await;
    }

    /// The persisted document exactly as committed
    pub async fn persisted_snapshot(&self) -> Result<Option<String>, StorageError> {
        self.persister.read_raw().await
    }

    /// Write a raw document verbatim and rehydrate from it
    pub async fn restore_snapshot(&self, raw: &str) -> Result<(), StorageError> {
        self.persister.write_raw(raw).await?;

        if !self.rehydrate().await {
            tracing::warn!("restored snapshot was not applied");
        }

        Ok(())
    }

    /// Fetch metadata, holding the result for at least `delay`
    async fn fetch_metadata(
        &self,
        id: SeriesId,
        delay: Duration,
        cancel: &CancellationToken,
    ) -> Result<Series, ApiError> {
        let series = self.client.fetch_series_metadata(id, cancel).await?;

        if !delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        Ok(series)
    }

    /// Start tracking a series
    pub async fn fetch_series(&self, id: SeriesId, cancel: &CancellationToken) {
        self.set("initLoading", |state| state.is_loading = true);

        match self
            .fetch_metadata(id, self.options.fetch_delay, cancel)
            .await
        {
            Ok(series) => self.set("initSuccess", |state| {
                let data = &mut state.data;

                data.tracking_series_map.insert(series.id, true);
                data.tracking_series_data
                    .entry(series.id)
                    .or_insert_with(|| build_tracking_series(&series));

                if data.series(series.id).is_none() {
                    data.series_data.push(series);
                }
            }),
            Err(e) if e.is_cancelled() => tracing::debug!(id, "fetch cancelled"),
            Err(e) => {
                let message = e.user_message();
                self.set("initError", |state| state.error = Some(message));
            }
        }

        self.set("initFinally", |state| state.is_loading = false);
    }

    /// Re-fetch a tracked series and reconcile its episodes, keeping
    /// watched state for every episode that still exists
    pub async fn refresh_series(&self, id: SeriesId, cancel: &CancellationToken) {
        self.set("refreshLoading", |state| state.is_refreshing = true);

        match self
            .fetch_metadata(id, self.options.refresh_delay, cancel)
            .await
        {
            Ok(updated) => self.set("refreshSuccess", |state| {
                let data = &mut state.data;

                let Some(index) = data.series_data.iter().position(|s| s.id == updated.id) else {
                    return;
                };
                let Some(existing) = data.tracking_series_data.get(&updated.id) else {
                    return;
                };

                let reconciled = reconcile_tracking_series(existing, &updated);
                data.tracking_series_data.insert(updated.id, reconciled);
                data.series_data[index] = updated;
            }),
            Err(e) if e.is_cancelled() => tracing::debug!(id, "refresh cancelled"),
            Err(e) => {
                let message = e.user_message();
                self.set("refreshError", |state| state.error = Some(message));
            }
        }

        self.set("refreshFinally", |state| state.is_refreshing = false);
    }

    /// Stop tracking a series and drop every trace of it
    pub fn remove_series(&self, id: SeriesId) {
        self.set("remove", |state| {
            let data = &mut state.data;

            let Some(index) = data.series_data.iter().position(|s| s.id == id) else {
                return;
            };

            data.series_data.remove(index);
            data.tracking_series_data.remove(&id);
            data.tracking_series_map.remove(&id);
            data.is_reward_shown_map.remove(&id);
            data.favorites_series_map.remove(&id);

            if data.active_series_id == Some(id) {
                data.active_series_id = data.series_data.first().map(|s| s.id);
            }
        });
    }

    /// Select a tracked series; unknown ids are ignored
    pub fn set_active_series_id(&self, id: SeriesId) {
        self.set("setActiveSeriesId", |state| {
            if state.data.series(id).is_some() {
                state.data.active_series_id = Some(id);
            } else {
                tracing::debug!(id, "ignoring selection of untracked series");
            }
        });
    }

    pub fn clear_error_state(&self) {
        self.set("clearErrorState", |state| state.error = None);
    }

    /// Mark one episode; stale episode addresses are ignored
    pub fn toggle_episode_watched(&self, toggle: ToggleEpisodeWatched) {
        self.set("toggleWatched", |state| {
            let Some(episode) = state
                .data
                .tracking_series_data
                .get_mut(&toggle.series_id)
                .and_then(|series| series.seasons.as_mut())
                .and_then(|seasons| seasons.get_mut(&toggle.season_id))
                .and_then(|season| season.episodes.get_mut(&toggle.episode_id))
            else {
                return;
            };

            episode.is_watched = toggle.is_watched;
            episode.timestamp = toggle.is_watched.then(now_iso);
        });
    }

    pub fn toggle_all_watched(
        &self,
        series_id: SeriesId,
        season_id: SeasonId,
        mode: ToggleAllWatchedMode,
    ) {
        let action = match mode {
            ToggleAllWatchedMode::Complete => "toggleAllWatched/mode:complete",
            ToggleAllWatchedMode::Reset => "toggleAllWatched/mode:reset",
        };

        self.set(action, |state| {
            let Some(season) = state
                .data
                .tracking_series_data
                .get_mut(&series_id)
                .and_then(|series| series.seasons.as_mut())
                .and_then(|seasons| seasons.get_mut(&season_id))
            else {
                return;
            };

            let timestamp = now_iso();
            for episode in season.episodes.values_mut() {
                match mode {
                    ToggleAllWatchedMode::Complete => {
                        if !episode.is_watched {
                            episode.is_watched = true;
                            episode.timestamp = Some(timestamp.clone());
                        }
                    }
                    ToggleAllWatchedMode::Reset => {
                        episode.is_watched = false;
                        episode.timestamp = None;
                    }
                }
            }
        });
    }

    /// Flip the favorite flag of a tracked series; unknown ids are ignored
    pub fn toggle_favorites(&self, id: SeriesId) {
        self.set("toggleFavorites", |state| {
            if state.data.series(id).is_none() {
                tracing::debug!(id, "ignoring favorite of untracked series");
                return;
            }

            let favorite = state.data.is_favorite(id);
            state.data.favorites_series_map.insert(id, !favorite);
        });
    }

    pub fn set_is_reward_shown(&self, id: SeriesId) {
        self.set("setIsRewardShown", |state| {
            if state.data.series(id).is_none() {
                tracing::debug!(id, "ignoring reward flag of untracked series");
                return;
            }

            state.data.is_reward_shown_map.insert(id, true);
        });
    }

    /// True exactly once per tracking entry: when the series has ended and
    /// every episode is watched. Claiming sets the reward-shown flag.
    pub fn claim_completion_reward(&self, id: SeriesId) -> bool {
        let due = {
            let state = self.state.borrow();
            let shown = state
                .data
                .is_reward_shown_map
                .get(&id)
                .copied()
                .unwrap_or(false);

            !shown
                && state
                    .data
                    .tracking_series_data
                    .get(&id)
                    .is_some_and(|t| t.is_ended() && t.progress().is_completed())
        };

        if due {
            self.set_is_reward_shown(id);
        }

        due
    }
}

/// Current time as ISO-8601 UTC with milliseconds
fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
