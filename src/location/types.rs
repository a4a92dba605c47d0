//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A WGS-84 position in decimal degrees. Ranges are not validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.lat >= 0.0 { 'N' } else { 'S' };
        let ew = if self.lon >= 0.0 { 'E' } else { 'W' };
        write!(f, "{:.4}\u{00B0}{}, {:.4}\u{00B0}{}", self.lat.abs(), ns, self.lon.abs(), ew)
    }
}

/// State and city resolved from a postal code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub state: String,
    pub city: String,
    /// Best-effort postal address line, may be empty.
    #[serde(default)]
    pub address: String,
}

/// A canonical city and its distance from the query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityDistance {
    pub city: String,
    /// Kilometres, rounded to one decimal place.
    pub distance_km: f64,
}

/// Where the distances in a [`ProximityReport`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceSource {
    /// Distances were computed from geocoded positions.
    Measured,
    /// The nearby search failed; entries are gazetteer defaults at distance 0.
    Placeholder,
}

impl fmt::Display for DistanceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Measured => write!(f, "measured"),
            Self::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// Full outcome of a proximity search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityReport {
    pub cities: Vec<CityDistance>,
    pub source: DistanceSource,
    /// Region name from the reverse geocode, if any.
    pub region_hint: Option<String>,
    /// The caller's time budget ran out before the search finished.
    pub timed_out: bool,
}

impl ProximityReport {
    pub(crate) fn measured(cities: Vec<CityDistance>, region_hint: Option<String>, timed_out: bool) -> Self {
        Self {
            cities,
            source: DistanceSource::Measured,
            region_hint,
            timed_out,
        }
    }
}

/// A place returned by the nearby search, before gazetteer matching.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyPlace {
    pub name: Option<String>,
    pub position: Option<Coordinate>,
}

/// Parameters of a nearby-places search.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    pub text: String,
    pub center: Coordinate,
    pub radius_km: f64,
    pub country_code: String,
    pub max_results: usize,
}

/// One post office record from a postal lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostOffice {
    pub name: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// Location resolution errors.
///
/// These never reach callers of the resolvers; they are raised by providers
/// and absorbed into empty or partial results.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
    #[error("Location not found: '{0}'")]
    NotFound(String),
    #[error("Invalid gazetteer: {0}")]
    InvalidGazetteer(String),
}

impl From<ureq::Error> for LocationError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                Self::Network(format!("HTTP {} from {}", code, response.get_url()))
            }
            ureq::Error::Transport(transport) => {
                let msg = transport.to_string();
                if is_timeout(&transport) {
                    Self::Timeout(msg)
                } else {
                    Self::Network(msg)
                }
            }
        }
    }
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    use std::error::Error;
    transport
        .source()
        .and_then(|e| e.downcast_ref::<std::io::Error>())
        .map(|io| matches!(io.kind(), std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock))
        .unwrap_or(false)
}
