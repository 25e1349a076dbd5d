use serde::{Deserialize, Serialize};

use crate::models::domain::ValuationResult;

/// Response for the estimate endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationResponse {
    #[serde(rename = "valuationId")]
    pub valuation_id: String,
    #[serde(flatten)]
    pub result: ValuationResult,
    #[serde(rename = "generatedAt")]
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    /// Populated for insufficient-data outcomes with a radius the caller
    /// could retry with.
    #[serde(rename = "suggestedRadiusKm", default, skip_serializing_if = "Option::is_none")]
    pub suggested_radius_km: Option<f64>,
}

impl ErrorResponse {
    pub fn new(error: &str, message: String, status_code: u16) -> Self {
        Self {
            error: error.to_string(),
            message,
            status_code,
            suggested_radius_km: None,
        }
    }
}
