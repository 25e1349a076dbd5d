use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{LocationPoint, PropertyFeatures};

/// Request to run a valuation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ValuationRequest {
    #[validate(nested)]
    pub location: LocationPoint,
    pub features: PropertyFeatures,
    /// Optional override of the configured search radius in kilometers.
    #[serde(rename = "radiusKm", default)]
    pub radius_km: Option<f64>,
}
