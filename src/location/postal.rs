//! Postal-code (PIN) resolution to a canonical state and city.

use super::cache::PostalCache;
use super::gazetteer::Gazetteer;
use super::providers::PostalLookup;
use super::types::{PostOffice, ResolvedLocation};
use log::{debug, warn};
use std::sync::Mutex;

/// Resolves postal codes with one lookup call each, optionally memoized.
pub struct PostalResolver<'g> {
    gazetteer: &'g Gazetteer,
    lookup: Box<dyn PostalLookup>,
    cache: Option<Mutex<PostalCache>>,
}

impl<'g> PostalResolver<'g> {
    pub fn new(gazetteer: &'g Gazetteer, lookup: Box<dyn PostalLookup>) -> Self {
        Self {
            gazetteer,
            lookup,
            cache: None,
        }
    }

    /// Serve repeat codes from `cache` and record successful resolutions in it.
    pub fn with_cache(mut self, cache: PostalCache) -> Self {
        self.cache = Some(Mutex::new(cache));
        self
    }

    /// True if `code` has the gazetteer's postal-code shape.
    pub fn is_well_formed(&self, code: &str) -> bool {
        let code = code.trim();
        code.len() == self.gazetteer.postal_code_len() && code.bytes().all(|b| b.is_ascii_digit())
    }

    /// State and city for `code`, or None if the code is malformed, unknown,
    /// or the lookup service is unavailable.
    pub fn resolve(&self, code: &str) -> Option<ResolvedLocation> {
        if !self.is_well_formed(code) {
            debug!("Rejecting malformed postal code '{}'", code);
            return None;
        }
        let code = code.trim();

        if let Some(hit) = self.cached(code) {
            debug!("Postal code {} served from cache", code);
            return Some(hit);
        }

        let offices = match self.lookup.lookup(code) {
            Ok(offices) => offices,
            Err(e) => {
                warn!("Postal lookup for {} failed: {}", code, e);
                return None;
            }
        };

        let resolved = offices.first().and_then(|o| self.from_office(o))?;
        self.remember(code, &resolved);
        Some(resolved)
    }

    fn from_office(&self, office: &PostOffice) -> Option<ResolvedLocation> {
        let state = non_blank(office.state.as_deref())?;
        let city = non_blank(office.district.as_deref()).or_else(|| non_blank(office.name.as_deref()))?;

        let address = [office.name.as_deref(), office.district.as_deref(), office.state.as_deref()]
            .into_iter()
            .filter_map(non_blank)
            .collect::<Vec<_>>()
            .join(", ");

        Some(ResolvedLocation {
            state: self.gazetteer.find_state(state).unwrap_or(state).to_string(),
            city: self.gazetteer.find_city(city).unwrap_or(city).to_string(),
            address,
        })
    }

    fn cached(&self, code: &str) -> Option<ResolvedLocation> {
        let cache = self.cache.as_ref()?.lock().ok()?;
        cache.get(code)
    }

    fn remember(&self, code: &str, resolved: &ResolvedLocation) {
        if let Some(Ok(mut cache)) = self.cache.as_ref().map(|c| c.lock()) {
            cache.put(code, resolved);
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
