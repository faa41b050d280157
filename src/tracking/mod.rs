//! Tracking data projected from series metadata.
//!
//! Episode identities are derived from position (`series:season:number`),
//! never from remote episode ids, so re-projecting after a refresh lands
//! on the same keys and watched state can be carried over.

mod model;
mod projector;

pub use model::{episode_id, Progress, TrackingEpisode, TrackingSeason, TrackingSeries};
pub use projector::{build_tracking_series, reconcile_tracking_series};
