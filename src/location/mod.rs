//! Location resolution for registration forms and "use my location".
//!
//! Validates state and city names against a fixed gazetteer, resolves
//! PIN codes to state and city, and finds the nearest gazetteer cities to a
//! coordinate.

pub mod cache;
pub mod gazetteer;
pub mod geodesic;
pub mod normalize;
pub mod postal;
pub mod providers;
pub mod proximity;
pub mod types;
pub mod validator;

pub use cache::PostalCache;
pub use gazetteer::Gazetteer;
pub use geodesic::distance_km;
pub use normalize::normalize;
pub use postal::PostalResolver;
pub use providers::{GeoService, NominatimClient, PincodeClient, PostalLookup};
pub use proximity::{Pacer, ProximityResolver, SystemPacer};
pub use types::{
    CityDistance, Coordinate, DistanceSource, LocationError, ProximityReport, ResolvedLocation,
};
pub use validator::{suggest, Validator};
