use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{ValuationEngine, ValuationError};
use crate::models::{ErrorResponse, HealthResponse, ValuationRequest, ValuationResponse};
use crate::services::{CacheKey, CacheManager, ComparableStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ComparableStore>,
    pub cache: Arc<CacheManager>,
    pub engine: ValuationEngine,
}

/// Configure all valuation-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/valuations/estimate", web::post().to(estimate));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Run a valuation
///
/// POST /api/v1/valuations/estimate
///
/// Request body:
/// ```json
/// {
///   "location": { "lat": 41.0082, "lng": 28.9784, "district": "Kadikoy" },
///   "features": { "propertyType": "residential", "area": 120, "roomCount": 3 },
///   "radiusKm": 5.0
/// }
/// ```
async fn estimate(
    state: web::Data<AppState>,
    req: web::Json<ValuationRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for estimate request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "validation_failed",
            errors.to_string(),
            400,
        ));
    }

    let req = req.into_inner();

    // Build the store query; this re-validates area and radius.
    let query = match state
        .engine
        .candidate_query(&req.location, &req.features, req.radius_km)
    {
        Ok(q) => q,
        Err(e) => {
            tracing::info!("Rejected estimate request: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse::new(
                "validation_failed",
                e.to_string(),
                400,
            ));
        }
    };

    let radius_km = req
        .radius_km
        .unwrap_or(state.engine.params().search_radius_km);
    let cache_key = CacheKey::valuation(&req.features, req.location.lat, req.location.lng, radius_km);

    if let Ok(cached) = state.cache.get::<ValuationResponse>(&cache_key).await {
        tracing::debug!("Serving cached valuation: {}", cache_key);
        return HttpResponse::Ok().json(cached);
    }

    let candidates = match state.store.find_comparables(&query).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Comparable store query failed: {}", e);
            return HttpResponse::ServiceUnavailable().json(ErrorResponse::new(
                "data_source_unavailable",
                ValuationError::DataSource(e.to_string()).to_string(),
                503,
            ));
        }
    };

    tracing::debug!("Fetched {} raw candidates for {}", candidates.len(), cache_key);

    let result = match state.engine.appraise(
        &req.location,
        &req.features,
        candidates,
        req.radius_km,
        chrono::Utc::now(),
    ) {
        Ok(result) => result,
        Err(ValuationError::Validation(message)) => {
            return HttpResponse::BadRequest().json(ErrorResponse::new(
                "validation_failed",
                message,
                400,
            ));
        }
        Err(e @ ValuationError::InsufficientData { suggested_radius_km, .. }) => {
            let mut body =
                ErrorResponse::new("insufficient_comparable_data", e.to_string(), 422);
            body.suggested_radius_km = Some(suggested_radius_km);
            return HttpResponse::UnprocessableEntity().json(body);
        }
        Err(e @ ValuationError::DataSource(_)) => {
            return HttpResponse::ServiceUnavailable().json(ErrorResponse::new(
                "data_source_unavailable",
                e.to_string(),
                503,
            ));
        }
    };

    tracing::info!(
        "Valuation complete: {} comparables, confidence {:.1}",
        result.comparables.len(),
        result.confidence_score
    );

    let response = ValuationResponse {
        valuation_id: uuid::Uuid::new_v4().to_string(),
        result,
        generated_at: chrono::Utc::now(),
    };

    // Best-effort cache write; a cold cache must never fail a valuation.
    if let Err(e) = state.cache.set(&cache_key, &response).await {
        tracing::warn!("Failed to cache valuation {}: {}", cache_key, e);
    }

    HttpResponse::Ok().json(response)
}
