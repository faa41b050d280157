use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::{SeasonId, SeriesId, SeriesStatus};

/// Composite episode identity `seriesId:seasonId:episodeNumber`
pub fn episode_id(series_id: SeriesId, season_id: SeasonId, number: u32) -> String {
    format!("{}:{}:{}", series_id, season_id, number)
}

/// A single episode's watched state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEpisode {
    pub id: String,
    pub number: u32,
    pub is_watched: bool,
    /// ISO-8601 UTC time the episode was marked watched
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingSeason {
    pub id: SeasonId,
    pub number: u32,
    /// Keyed by episode identity
    pub episodes: BTreeMap<String, TrackingEpisode>,
}

impl TrackingSeason {
    /// Episodes ordered by episode number
    pub fn episodes_in_order(&self) -> Vec<&TrackingEpisode> {
        let mut episodes: Vec<_> = self.episodes.values().collect();
        episodes.sort_by_key(|episode| episode.number);
        episodes
    }

    pub fn progress(&self) -> Progress {
        Progress {
            watched: self.episodes.values().filter(|e| e.is_watched).count(),
            total: self.episodes.len(),
        }
    }
}

/// Per-series tracking entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingSeries {
    pub id: SeriesId,
    pub name: String,
    pub status: Option<SeriesStatus>,
    /// `None` when the metadata had no season detail at all
    pub seasons: Option<BTreeMap<SeasonId, TrackingSeason>>,
}

impl TrackingSeries {
    /// Seasons ordered by season number
    pub fn seasons_in_order(&self) -> Vec<&TrackingSeason> {
        let mut seasons: Vec<_> = self.seasons.iter().flat_map(|s| s.values()).collect();
        seasons.sort_by_key(|season| season.number);
        seasons
    }

    pub fn progress(&self) -> Progress {
        self.seasons
            .iter()
            .flat_map(|s| s.values())
            .map(TrackingSeason::progress)
            .fold(Progress::default(), |acc, p| Progress {
                watched: acc.watched + p.watched,
                total: acc.total + p.total,
            })
    }

    pub fn is_ended(&self) -> bool {
        self.status == Some(SeriesStatus::Ended)
    }
}

/// Watched versus total episode counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub watched: usize,
    pub total: usize,
}

impl Progress {
    /// Rounded percentage, 0 when there is nothing to watch
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.watched as f64 / self.total as f64) * 100.0).round() as u32
    }

    pub fn is_completed(&self) -> bool {
        self.total > 0 && self.watched == self.total
    }
}
