use std::collections::BTreeMap;

use crate::api::Series;
use crate::tracking::model::{episode_id, TrackingEpisode, TrackingSeason, TrackingSeries};

/// Build a fresh, all-unwatched tracking entry from series metadata.
///
/// Seasons with an unknown or zero episode order are skipped entirely;
/// no episodes are guessed for them.
pub fn build_tracking_series(series: &Series) -> TrackingSeries {
    let seasons = series.seasons();

    if seasons.is_empty() {
        return TrackingSeries {
            id: series.id,
            name: series.name.clone(),
            status: Some(series.status),
            seasons: None,
        };
    }

    let mut tracking_seasons = BTreeMap::new();

    for season in seasons {
        let episode_count = match season.episode_order {
            Some(count) if count > 0 => count,
            _ => continue,
        };

        let episodes = (1..=episode_count)
            .map(|number| {
                let id = episode_id(series.id, season.id, number);
                let episode = TrackingEpisode {
                    id: id.clone(),
                    number,
                    is_watched: false,
                    timestamp: None,
                };
                (id, episode)
            })
            .collect();

        tracking_seasons.insert(
            season.id,
            TrackingSeason {
                id: season.id,
                number: season.number,
                episodes,
            },
        );
    }

    TrackingSeries {
        id: series.id,
        name: series.name.clone(),
        status: Some(series.status),
        seasons: Some(tracking_seasons),
    }
}

/// Rebuild the entry from updated metadata, carrying over the watched
/// state of every episode identity that still exists. Identities that
/// disappeared are dropped.
pub fn reconcile_tracking_series(existing: &TrackingSeries, updated: &Series) -> TrackingSeries {
    let mut fresh = build_tracking_series(updated);

    if let (Some(existing_seasons), Some(fresh_seasons)) =
        (&existing.seasons, fresh.seasons.as_mut())
    {
        for (season_id, fresh_season) in fresh_seasons.iter_mut() {
            let Some(existing_season) = existing_seasons.get(season_id) else {
                continue;
            };

            for (id, fresh_episode) in fresh_season.episodes.iter_mut() {
                if let Some(existing_episode) = existing_season.episodes.get(id) {
                    fresh_episode.is_watched = existing_episode.is_watched;
                    fresh_episode.timestamp = existing_episode.timestamp.clone();
                }
            }
        }
    }

    fresh
}
