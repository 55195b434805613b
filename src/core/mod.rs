// Core engine exports
pub mod discovery;
pub mod distance;
pub mod error;
pub mod filters;
pub mod ledger;
pub mod matcher;
pub mod scoring;
pub mod swipe;

pub use discovery::{rank_candidates, Discovery};
pub use distance::{distance_between, haversine_distance, EARTH_RADIUS_M};
pub use error::EngineError;
pub use filters::{is_unswiped_candidate, matches_filter};
pub use matcher::check_mutual;
pub use scoring::{bump, score_delta};
pub use swipe::{SwipeEngine, SwipeState};
