use crate::models::{BoundingBox, ComparableListing, LocationPoint};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Assumed distance for a comparable in the same neighborhood but without
/// coordinates.
const SAME_NEIGHBORHOOD_KM: f64 = 0.75;

/// Assumed distance for a comparable in the same district but without
/// coordinates.
const SAME_DISTRICT_KM: f64 = 3.0;

/// Distance between the target and one comparable, with a flag for how it
/// was derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceEstimate {
    pub km: f64,
    /// True when computed from coordinates, false for the textual proxy.
    pub precise: bool,
}

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Calculate a bounding box around a center point
///
/// This is much faster than Haversine for pre-filtering.
/// 1° latitude ≈ 111km, 1° longitude ≈ 111km * cos(latitude)
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    // 1 degree latitude is approximately 111 km
    let lat_delta = radius_km / 111.0;

    // 1 degree longitude varies by latitude
    let lon_delta = radius_km / (111.0 * lat.to_radians().cos().abs());

    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    lat >= bbox.min_lat && lat <= bbox.max_lat && lon >= bbox.min_lon && lon <= bbox.max_lon
}

/// Case-insensitive equality for textual location parts.
fn same_place(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => false,
    }
}

/// Place a comparable relative to the target.
///
/// Listings with coordinates get a precise haversine distance. Listings
/// crawled without coordinates fall back to address overlap: same
/// neighborhood counts as 0.75 km, same district as 3 km, both flagged
/// imprecise. Returns None when the listing cannot be placed at all.
pub fn comparable_distance(
    target: &LocationPoint,
    listing: &ComparableListing,
) -> Option<DistanceEstimate> {
    if let Some((lat, lng)) = listing.coordinates() {
        return Some(DistanceEstimate {
            km: haversine_distance(target.lat, target.lng, lat, lng),
            precise: true,
        });
    }

    if same_place(target.neighborhood.as_deref(), listing.neighborhood.as_deref()) {
        return Some(DistanceEstimate {
            km: SAME_NEIGHBORHOOD_KM,
            precise: false,
        });
    }

    if same_place(target.district.as_deref(), listing.district.as_deref()) {
        return Some(DistanceEstimate {
            km: SAME_DISTRICT_KM,
            precise: false,
        });
    }

    None
}
