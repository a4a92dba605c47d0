//! Great-circle distances on a spherical Earth.

use super::types::Coordinate;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree of latitude (and of longitude at the equator).
const KM_PER_DEGREE: f64 = 111.32;

/// Haversine distance between two coordinates in kilometres.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Round to one decimal place.
pub fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Axis-aligned box in degrees, enclosing a circle around a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// `left,top,right,bottom` as Nominatim's `viewbox` parameter expects.
    pub fn to_viewbox(&self) -> String {
        format!(
            "{:.5},{:.5},{:.5},{:.5}",
            self.min_lon, self.max_lat, self.max_lon, self.min_lat
        )
    }
}

/// Box enclosing all points within `radius_km` of `center`.
pub fn bounding_box(center: Coordinate, radius_km: f64) -> BoundingBox {
    let d_lat = radius_km / KM_PER_DEGREE;
    let cos_lat = center.lat.to_radians().cos().abs();
    // Near the poles every longitude is within reach.
    let d_lon = if cos_lat < 1e-6 {
        180.0
    } else {
        (radius_km / (KM_PER_DEGREE * cos_lat)).min(180.0)
    };

    BoundingBox {
        min_lon: (center.lon - d_lon).max(-180.0),
        min_lat: (center.lat - d_lat).max(-90.0),
        max_lon: (center.lon + d_lon).min(180.0),
        max_lat: (center.lat + d_lat).min(90.0),
    }
}
