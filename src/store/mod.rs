//! State containers. Each store publishes its full state through a
//! `watch` channel; every action replaces the state with an updated copy.

mod filter;
mod license;
pub mod persist;
mod search;
mod series;

pub use filter::select_filtered_series;
pub use license::{LicensePhase, LicenseState, LicenseStore};
pub use persist::{Persisted, PERSIST_VERSION};
pub use search::{SearchState, SearchStore};
pub use series::{
    SeriesState, SeriesStore, SeriesStoreOptions, ToggleAllWatchedMode, ToggleEpisodeWatched,
    TrackedSeries,
};
