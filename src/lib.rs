//! Emlak Algo - property valuation engine for the Emlak platform
//!
//! This library estimates a property's market value from comparable
//! crawled listings. It implements a three-stage pipeline: candidate
//! selection, distance/similarity scoring, and weighted aggregation into
//! an estimate with a value band and a confidence score.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{ValuationEngine, ValuationError, ValuationParams, distance::{haversine_distance, calculate_bounding_box}};
pub use crate::models::{ComparableListing, LocationPoint, PropertyFeatures, PropertyType, SimilarityWeights, ValuationRequest, ValuationResponse, ValuationResult};
