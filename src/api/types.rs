use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type SeriesId = u64;
pub type SeasonId = u64;

/// Airing status as reported by the metadata API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesStatus {
    Running,
    Ended,
    #[serde(rename = "To Be Determined")]
    ToBeDetermined,
    #[serde(rename = "In Development")]
    InDevelopment,
    #[serde(other)]
    Unknown,
}

impl SeriesStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SeriesStatus::Running => "Running",
            SeriesStatus::Ended => "Ended",
            SeriesStatus::ToBeDetermined => "To Be Determined",
            SeriesStatus::InDevelopment => "In Development",
            SeriesStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub medium: Option<String>,
    pub original: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: Option<f64>,
}

/// Season record embedded in an expanded series response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub id: SeasonId,
    pub number: u32,
    #[serde(default)]
    pub name: Option<String>,
    /// Expected episode count; `None` when unknown
    #[serde(default)]
    pub episode_order: Option<u32>,
    #[serde(default)]
    pub premiere_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub image: Option<Image>,
    /// Fields this crate does not read, kept so stored records round-trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embedded {
    #[serde(default)]
    pub seasons: Vec<Season>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Series metadata, immutable per fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: SeriesId,
    pub name: String,
    pub status: SeriesStatus,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub premiered: Option<String>,
    #[serde(default)]
    pub ended: Option<String>,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(rename = "_embedded", default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<Embedded>,
    /// Everything else the API sent (`type`, `schedule`, `externals`, `_links`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Series {
    /// Embedded seasons, empty when the series was fetched without detail
    pub fn seasons(&self) -> &[Season] {
        self.embedded
            .as_ref()
            .map(|e| e.seasons.as_slice())
            .unwrap_or(&[])
    }

    /// "2011 – 2019", "2011 – present", "Ended: 2019" or nothing
    pub fn years_display(&self) -> Option<String> {
        let premiered = self.premiered.as_deref().and_then(year_of);
        let ended = self.ended.as_deref().and_then(year_of);

        match (premiered, ended) {
            (Some(start), Some(end)) => Some(format!("{} – {}", start, end)),
            (Some(start), None) => Some(format!("{} – present", start)),
            (None, Some(end)) => Some(format!("Ended: {}", end)),
            (None, None) => None,
        }
    }
}

fn year_of(date: &str) -> Option<i32> {
    date.split('-').next().and_then(|y| y.parse().ok())
}

/// One hit of the search endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub score: f64,
    pub show: Series,
}
