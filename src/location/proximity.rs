//! Nearest canonical cities to a coordinate.
//!
//! Pipeline: reverse geocode (hint only) → nearby-places search → loose
//! gazetteer matching with first-match-wins dedup → radius filter →
//! rate-limited per-city geocode fallback → sort, truncate, round.
//!
//! No step surfaces an error. Individual provider failures shrink the
//! result; a failed nearby search yields gazetteer placeholders at
//! distance 0 (see [`DistanceSource::Placeholder`]).

use super::gazetteer::Gazetteer;
use super::geodesic::{distance_km, round_tenth};
use super::normalize::{loosely_matches, normalize};
use super::providers::GeoService;
use super::types::{CityDistance, Coordinate, DistanceSource, NearbyQuery, ProximityReport};
use crate::config::ResolverConfig;
use log::{debug, warn};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Free-text query sent with the nearby-places search.
const NEARBY_QUERY_TEXT: &str = "city";

/// Clock and sleep used for rate limiting and time budgets.
pub trait Pacer: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Real wall-clock pacing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPacer;

impl Pacer for SystemPacer {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    radius_km: f64,
    nearby_cap: usize,
    delay: Duration,
    max_fallback_calls: usize,
    fallback_calls_per_result: usize,
}

impl From<&ResolverConfig> for Limits {
    fn from(c: &ResolverConfig) -> Self {
        Self {
            radius_km: c.search_radius_km,
            nearby_cap: c.nearby_result_cap,
            delay: c.fallback_delay,
            max_fallback_calls: c.fallback_max_calls,
            fallback_calls_per_result: c.fallback_calls_per_result,
        }
    }
}

/// Resolves coordinates to the nearest gazetteer cities.
pub struct ProximityResolver<'g> {
    gazetteer: &'g Gazetteer,
    geo: Box<dyn GeoService>,
    pacer: Box<dyn Pacer>,
    limits: Limits,
}

impl<'g> ProximityResolver<'g> {
    pub fn new(gazetteer: &'g Gazetteer, geo: Box<dyn GeoService>, config: &ResolverConfig) -> Self {
        Self {
            gazetteer,
            geo,
            pacer: Box::new(SystemPacer),
            limits: Limits::from(config),
        }
    }

    /// Replace the wall clock, e.g. with a simulated one.
    pub fn with_pacer(mut self, pacer: Box<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Up to `limit` cities ordered by ascending distance.
    pub fn nearest_cities(&self, at: Coordinate, limit: usize) -> Vec<CityDistance> {
        self.search(at, limit, None).cities
    }

    /// Full search. With a `budget`, every external call is cut off when the
    /// budget runs out, none is started afterwards, and whatever was found so
    /// far is returned.
    pub fn search(&self, at: Coordinate, limit: usize, budget: Option<Duration>) -> ProximityReport {
        if limit == 0 {
            return ProximityReport::measured(Vec::new(), None, false);
        }
        let deadline = budget.map(|b| self.pacer.now() + b);

        if self.expired(deadline) {
            return ProximityReport::measured(Vec::new(), None, true);
        }
        let region_hint = match self.geo.reverse_geocode(at, self.remaining(deadline)) {
            Ok(hint) => hint,
            Err(e) => {
                warn!("Reverse geocode of {} failed: {}", at, e);
                None
            }
        };
        debug!("Region hint for {}: {:?}", at, region_hint);

        if self.expired(deadline) {
            return ProximityReport::measured(Vec::new(), region_hint, true);
        }
        let query = NearbyQuery {
            text: NEARBY_QUERY_TEXT.to_string(),
            center: at,
            radius_km: self.limits.radius_km,
            country_code: self.gazetteer.country_code().to_string(),
            max_results: self.limits.nearby_cap,
        };
        let places = match self.geo.search_nearby(&query, self.remaining(deadline)) {
            Ok(places) => places,
            Err(e) => {
                if self.expired(deadline) {
                    return ProximityReport::measured(Vec::new(), region_hint, true);
                }
                warn!("Nearby search around {} failed, using gazetteer defaults: {}", at, e);
                return self.placeholder(limit, region_hint);
            }
        };

        // First candidate mapping to a city decides its distance.
        let mut matched: HashSet<&str> = HashSet::new();
        let mut found: Vec<CityDistance> = Vec::new();
        for place in &places {
            let (Some(name), Some(pos)) = (place.name.as_deref(), place.position) else {
                continue;
            };
            let Some(city) = self.gazetteer.match_city_loosely(name) else {
                continue;
            };
            if matched.insert(city) {
                found.push(CityDistance {
                    city: city.to_string(),
                    distance_km: distance_km(at, pos),
                });
            }
        }
        found.retain(|c| c.distance_km <= self.limits.radius_km);
        debug!(
            "{} nearby places matched {} cities, {} within {} km",
            places.len(),
            matched.len(),
            found.len(),
            self.limits.radius_km
        );

        let mut timed_out = false;
        if found.len() < limit {
            timed_out = self.fill_by_geocoding(at, limit, &matched, region_hint.as_deref(), deadline, &mut found);
        }

        found.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        found.truncate(limit);
        for c in &mut found {
            c.distance_km = round_tenth(c.distance_km);
        }

        ProximityReport::measured(found, region_hint, timed_out)
    }

    /// Geocode unmatched gazetteer cities one at a time, pausing between
    /// calls. Returns true if the deadline cut the loop short.
    fn fill_by_geocoding(
        &self,
        at: Coordinate,
        limit: usize,
        matched: &HashSet<&str>,
        region_hint: Option<&str>,
        deadline: Option<Instant>,
        found: &mut Vec<CityDistance>,
    ) -> bool {
        let max_calls = limit
            .saturating_mul(self.limits.fallback_calls_per_result)
            .min(self.limits.max_fallback_calls);
        let candidates = self.fallback_candidates(matched, region_hint, max_calls);
        debug!("Geocoding up to {} fallback cities", candidates.len());

        for (i, city) in candidates.into_iter().enumerate() {
            if found.len() >= limit {
                break;
            }
            if i > 0 {
                if let Some(d) = deadline {
                    if self.pacer.now() + self.limits.delay > d {
                        return true;
                    }
                }
                self.pacer.sleep(self.limits.delay);
            }
            if self.expired(deadline) {
                return true;
            }

            let within = self.remaining(deadline);
            match self.geo.geocode_city(city, self.gazetteer.country_code(), within) {
                Ok(Some(pos)) => {
                    let distance = distance_km(at, pos);
                    if distance <= self.limits.radius_km {
                        found.push(CityDistance {
                            city: city.to_string(),
                            distance_km: distance,
                        });
                    } else {
                        debug!("{} is {:.1} km away, outside radius", city, distance);
                    }
                }
                Ok(None) => debug!("Geocoder has no position for {}", city),
                Err(e) => warn!("Geocoding {} failed: {}", city, e),
            }
        }
        false
    }

    /// Unmatched cities, those resembling the region hint first, then
    /// gazetteer order.
    fn fallback_candidates(&self, matched: &HashSet<&str>, region_hint: Option<&str>, max: usize) -> Vec<&'g str> {
        let hint = region_hint.map(normalize).unwrap_or_default();
        let (near_hint, rest): (Vec<&'g str>, Vec<&'g str>) = self
            .gazetteer
            .cities()
            .iter()
            .map(String::as_str)
            .filter(|c| !matched.contains(c))
            .partition(|c| loosely_matches(&normalize(c), &hint));

        near_hint.into_iter().chain(rest).take(max).collect()
    }

    fn placeholder(&self, limit: usize, region_hint: Option<String>) -> ProximityReport {
        let cities = self
            .gazetteer
            .cities()
            .iter()
            .take(limit)
            .map(|city| CityDistance {
                city: city.clone(),
                distance_km: 0.0,
            })
            .collect();
        ProximityReport {
            cities,
            source: DistanceSource::Placeholder,
            region_hint,
            timed_out: false,
        }
    }

    fn expired(&self, deadline: Option<Instant>) -> bool {
        deadline.is_some_and(|d| self.pacer.now() >= d)
    }

    fn remaining(&self, deadline: Option<Instant>) -> Option<Duration> {
        deadline.map(|d| d.saturating_duration_since(self.pacer.now()))
    }
}
