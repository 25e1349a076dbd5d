// Core algorithm exports
pub mod distance;
pub mod estimator;
pub mod scoring;
pub mod selector;

pub use distance::{calculate_bounding_box, comparable_distance, haversine_distance, is_within_bounding_box, DistanceEstimate};
pub use estimator::{ValuationEngine, ValuationError, ValuationParams};
pub use scoring::{area_proximity_score, calculate_similarity, feature_overlap_score, raw_weight, recency_score};
pub use selector::{is_usable, matches_category, matches_transaction, select_candidates, within_search_area};
