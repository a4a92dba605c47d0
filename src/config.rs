//! Runtime configuration for the resolvers and their HTTP providers.
//!
//! Every value has a built-in default; environment variables override them.
//! Invalid overrides are logged and ignored.

use log::{info, warn};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_POSTAL_URL: &str = "https://api.postalpincode.in";
pub const DEFAULT_USER_AGENT: &str = "Locality/0.3 (pin-code and city resolver)";

#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Base URL of the Nominatim-compatible geocoder.
    pub nominatim_url: String,
    /// Base URL of the postal-code lookup service.
    pub postal_url: String,
    pub user_agent: String,
    /// Upper bound for any single HTTP request.
    pub http_timeout: Duration,
    /// Cities farther than this are never reported as nearby.
    pub search_radius_km: f64,
    /// Result cap requested from the nearby-places search.
    pub nearby_result_cap: usize,
    /// Minimum gap between consecutive per-city geocode calls.
    pub fallback_delay: Duration,
    /// Absolute cap on per-city geocode calls per search.
    pub fallback_max_calls: usize,
    /// Per-city geocode calls allowed per requested result.
    pub fallback_calls_per_result: usize,
    /// Postal cache file; `None` uses `~/.locality/pincodes.json`.
    pub cache_path: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            postal_url: DEFAULT_POSTAL_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout: Duration::from_secs(10),
            search_radius_km: 50.0,
            nearby_result_cap: 50,
            fallback_delay: Duration::from_millis(200),
            fallback_max_calls: 20,
            fallback_calls_per_result: 3,
            cache_path: None,
        }
    }
}

impl ResolverConfig {
    /// Defaults overridden by `LOCALITY_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            nominatim_url: lookup("LOCALITY_NOMINATIM_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.nominatim_url),
            postal_url: lookup("LOCALITY_POSTAL_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.postal_url),
            user_agent: lookup("LOCALITY_USER_AGENT").unwrap_or(defaults.user_agent),
            http_timeout: Duration::from_secs(parse_or(&lookup, "LOCALITY_HTTP_TIMEOUT_SECS", 10)),
            fallback_delay: Duration::from_millis(parse_or(
                &lookup,
                "LOCALITY_FALLBACK_DELAY_MS",
                200,
            )),
            cache_path: lookup("LOCALITY_CACHE_PATH").map(PathBuf::from),
            ..defaults
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(v) => {
                info!("{key} set to {v}");
                v
            }
            Err(e) => {
                warn!("Invalid {key} value '{raw}': {e}, using default {default}");
                default
            }
        },
    }
}
