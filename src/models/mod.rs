// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BoundingBox, ComparableListing, ComparableQuery, LocationPoint, MarketSummary,
    PropertyDetails, PropertyFeatures, PropertyType, ScoredComparable, SimilarityWeights,
    TransactionType, ValuationResult,
};
pub use requests::ValuationRequest;
pub use responses::{ErrorResponse, HealthResponse, ValuationResponse};
