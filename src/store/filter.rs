use std::collections::BTreeMap;

use crate::api::{Series, SeriesId};

/// Series matching the list filter, in tracking order. A blank query
/// matches everything; otherwise the name or any genre must contain it,
/// ignoring case.
pub fn select_filtered_series<'a>(
    series_data: &'a [Series],
    filter_query: Option<&str>,
    only_favorites: bool,
    favorites: &BTreeMap<SeriesId, bool>,
) -> Vec<&'a Series> {
    let query = filter_query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    series_data
        .iter()
        .filter(|series| !only_favorites || favorites.get(&series.id).copied().unwrap_or(false))
        .filter(|series| match &query {
            Some(query) => {
                series.name.to_lowercase().contains(query.as_str())
                    || series
                        .genres
                        .iter()
                        .any(|genre| genre.to_lowercase().contains(query.as_str()))
            }
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::series;

    fn catalog() -> Vec<Series> {
        let mut comedy = series(2, &[]);
        comedy.name = "Parks and Recreation".to_string();
        comedy.genres = vec!["Comedy".to_string()];

        let mut drama = series(1, &[]);
        drama.name = "The Wire".to_string();

        vec![drama, comedy]
    }

    fn ids(series: Vec<&Series>) -> Vec<SeriesId> {
        series.into_iter().map(|s| s.id).collect()
    }

    #[test]
    fn test_blank_query_keeps_everything() {
        let data = catalog();
        let favorites = BTreeMap::new();

        assert_eq!(ids(select_filtered_series(&data, None, false, &favorites)), vec![1, 2]);
        assert_eq!(ids(select_filtered_series(&data, Some("  "), false, &favorites)), vec![1, 2]);
    }

    #[test]
    fn test_matches_name_or_genre_ignoring_case() {
        let data = catalog();
        let favorites = BTreeMap::new();

        assert_eq!(ids(select_filtered_series(&data, Some("WIRE"), false, &favorites)), vec![1]);
        assert_eq!(ids(select_filtered_series(&data, Some(" comedy "), false, &favorites)), vec![2]);
        assert!(select_filtered_series(&data, Some("western"), false, &favorites).is_empty());
    }

    #[test]
    fn test_only_favorites() {
        let data = catalog();
        let favorites = BTreeMap::from([(2, true), (1, false)]);

        assert_eq!(ids(select_filtered_series(&data, None, true, &favorites)), vec![2]);
        assert!(select_filtered_series(&data, Some("wire"), true, &favorites).is_empty());
    }
}
