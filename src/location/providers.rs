//! Location providers: Nominatim geocoding and the India Post PIN-code API.
//!
//! Resolvers only talk to the network through [`GeoService`] and
//! [`PostalLookup`], so tests can swap in scripted implementations.

use super::geodesic::bounding_box;
use super::types::{Coordinate, LocationError, NearbyPlace, NearbyQuery, PostOffice};
use crate::config::ResolverConfig;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Coordinate-based geocoding operations.
///
/// `within`, when set, is the time left to the caller. An implementation must
/// give up on the call once it has elapsed.
pub trait GeoService: Send + Sync {
    /// Best-guess containing region (city, district or state) for `at`.
    fn reverse_geocode(&self, at: Coordinate, within: Option<Duration>) -> Result<Option<String>, LocationError>;

    /// Places of interest inside a radius, bounded to one country.
    fn search_nearby(&self, query: &NearbyQuery, within: Option<Duration>) -> Result<Vec<NearbyPlace>, LocationError>;

    /// Position of a named city within a country, if the geocoder knows it.
    fn geocode_city(
        &self,
        city: &str,
        country_code: &str,
        within: Option<Duration>,
    ) -> Result<Option<Coordinate>, LocationError>;
}

/// Postal-code to post-office lookup.
pub trait PostalLookup: Send + Sync {
    /// Office records for `code`. A code the service does not know is `NotFound`.
    fn lookup(&self, code: &str) -> Result<Vec<PostOffice>, LocationError>;
}

fn build_agent(config: &ResolverConfig) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(config.http_timeout)
        .user_agent(&config.user_agent)
        .build()
}

fn get_json<T: DeserializeOwned>(
    agent: &ureq::Agent,
    url: &str,
    params: &[(&str, String)],
    timeout: Option<Duration>,
) -> Result<T, LocationError> {
    let mut request = agent.get(url);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }
    for (key, value) in params {
        request = request.query(key, value);
    }
    debug!("GET {} {:?}", url, params);

    let response = request.call()?;
    response
        .into_json()
        .map_err(|e| LocationError::InvalidResponse(e.to_string()))
}

// ─── Nominatim provider ─────────────────────────────────────────

#[derive(Deserialize, Debug, Clone, Default)]
struct NominatimAddress {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    town: Option<String>,
    #[serde(default)]
    village: Option<String>,
    #[serde(default)]
    suburb: Option<String>,
    #[serde(default)]
    county: Option<String>,
    #[serde(default)]
    state_district: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

impl NominatimAddress {
    /// Most specific settlement-level name present.
    fn locality(&self) -> Option<&str> {
        [
            &self.city,
            &self.town,
            &self.village,
            &self.suburb,
            &self.county,
            &self.state_district,
        ]
        .into_iter()
        .filter_map(|f| f.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
    }

    fn region(&self) -> Option<&str> {
        self.locality().or_else(|| {
            self.state
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
struct NominatimPlace {
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    lon: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

impl NominatimPlace {
    fn position(&self) -> Option<Coordinate> {
        let lat = self.lat.as_deref()?.trim().parse().ok()?;
        let lon = self.lon.as_deref()?.trim().parse().ok()?;
        Some(Coordinate::new(lat, lon))
    }

    fn locality(&self) -> Option<String> {
        self.address
            .as_ref()
            .and_then(|a| a.locality())
            .or_else(|| self.name.as_deref().map(str::trim).filter(|s| !s.is_empty()))
            .map(str::to_string)
    }
}

#[derive(Deserialize, Debug)]
struct NominatimReverse {
    #[serde(default)]
    address: Option<NominatimAddress>,
    #[serde(default)]
    error: Option<String>,
}

/// OpenStreetMap Nominatim over blocking HTTP.
pub struct NominatimClient {
    agent: ureq::Agent,
    base_url: String,
    http_timeout: Duration,
}

impl NominatimClient {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            agent: build_agent(config),
            base_url: config.nominatim_url.trim_end_matches('/').to_string(),
            http_timeout: config.http_timeout,
        }
    }

    /// Per-request timeout: the agent's, shortened to what the caller has left.
    fn timeout(&self, within: Option<Duration>) -> Option<Duration> {
        within.map(|w| w.min(self.http_timeout))
    }

    fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        within: Option<Duration>,
    ) -> Result<T, LocationError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        get_json(&self.agent, &url, params, self.timeout(within))
    }
}

impl GeoService for NominatimClient {
    fn reverse_geocode(&self, at: Coordinate, within: Option<Duration>) -> Result<Option<String>, LocationError> {
        let params = [
            ("format", "jsonv2".to_string()),
            ("lat", at.lat.to_string()),
            ("lon", at.lon.to_string()),
            ("zoom", "10".to_string()),
            ("addressdetails", "1".to_string()),
        ];
        let body: NominatimReverse = self.get("reverse", &params, within)?;

        if let Some(err) = body.error {
            return Err(LocationError::NotFound(format!("{} ({})", at, err)));
        }
        Ok(body
            .address
            .as_ref()
            .and_then(|a| a.region())
            .map(str::to_string))
    }

    fn search_nearby(&self, query: &NearbyQuery, within: Option<Duration>) -> Result<Vec<NearbyPlace>, LocationError> {
        let viewbox = bounding_box(query.center, query.radius_km).to_viewbox();
        let params = [
            ("q", query.text.clone()),
            ("format", "jsonv2".to_string()),
            ("addressdetails", "1".to_string()),
            ("limit", query.max_results.to_string()),
            ("countrycodes", query.country_code.clone()),
            ("viewbox", viewbox),
            ("bounded", "1".to_string()),
        ];
        let places: Vec<NominatimPlace> = self.get("search", &params, within)?;
        debug!("Nearby search returned {} places", places.len());

        Ok(places
            .iter()
            .map(|p| NearbyPlace {
                name: p.locality(),
                position: p.position(),
            })
            .collect())
    }

    fn geocode_city(
        &self,
        city: &str,
        country_code: &str,
        within: Option<Duration>,
    ) -> Result<Option<Coordinate>, LocationError> {
        let params = [
            ("q", city.to_string()),
            ("format", "jsonv2".to_string()),
            ("countrycodes", country_code.to_string()),
            ("limit", "1".to_string()),
        ];
        let places: Vec<NominatimPlace> = self.get("search", &params, within)?;
        Ok(places.first().and_then(NominatimPlace::position))
    }
}

// ─── PIN-code provider ──────────────────────────────────────────

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct PincodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    post_office: Option<Vec<PincodeOffice>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct PincodeOffice {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl From<PincodeOffice> for PostOffice {
    fn from(o: PincodeOffice) -> Self {
        PostOffice {
            name: o.name,
            district: o.district,
            state: o.state,
            country: o.country,
        }
    }
}

/// `api.postalpincode.in` over blocking HTTP.
pub struct PincodeClient {
    agent: ureq::Agent,
    base_url: String,
}

impl PincodeClient {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            agent: build_agent(config),
            base_url: config.postal_url.trim_end_matches('/').to_string(),
        }
    }
}

impl PostalLookup for PincodeClient {
    fn lookup(&self, code: &str) -> Result<Vec<PostOffice>, LocationError> {
        let url = format!("{}/pincode/{}", self.base_url, code);
        let body: Vec<PincodeResponse> = get_json(&self.agent, &url, &[], None)?;

        let first = body
            .into_iter()
            .next()
            .ok_or_else(|| LocationError::InvalidResponse("empty response array".into()))?;

        if !first.status.eq_ignore_ascii_case("success") {
            debug!(
                "PIN {} lookup status '{}': {}",
                code,
                first.status,
                first.message.as_deref().unwrap_or("")
            );
            return Err(LocationError::NotFound(code.to_string()));
        }

        let offices: Vec<PostOffice> = first
            .post_office
            .unwrap_or_default()
            .into_iter()
            .map(PostOffice::from)
            .collect();
        if offices.is_empty() {
            return Err(LocationError::NotFound(code.to_string()));
        }
        Ok(offices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::io::Write;
    use std::time::Instant;

    fn config_for(server: &Server) -> ResolverConfig {
        ResolverConfig {
            nominatim_url: server.url(),
            postal_url: server.url(),
            http_timeout: Duration::from_secs(5),
            ..ResolverConfig::default()
        }
    }

    #[test]
    fn test_address_locality_priority() {
        let addr = NominatimAddress {
            town: Some("Hinjawadi".into()),
            county: Some("Mulshi".into()),
            state: Some("Maharashtra".into()),
            ..Default::default()
        };
        assert_eq!(addr.locality(), Some("Hinjawadi"));

        let state_only = NominatimAddress {
            state: Some("Goa".into()),
            city: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(state_only.locality(), None);
        assert_eq!(state_only.region(), Some("Goa"));
    }

    #[test]
    fn test_place_position_parsing() {
        let place: NominatimPlace =
            serde_json::from_str(r#"{"lat":"18.52","lon":"73.85","name":"Pune"}"#).unwrap();
        assert_eq!(place.position(), Some(Coordinate::new(18.52, 73.85)));
        assert_eq!(place.locality(), Some("Pune".to_string()));

        let bad: NominatimPlace = serde_json::from_str(r#"{"lat":"north","lon":"73.85"}"#).unwrap();
        assert_eq!(bad.position(), None);
        assert_eq!(bad.locality(), None);
    }

    #[test]
    fn test_reverse_geocode_region() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/reverse")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("format".into(), "jsonv2".into()),
                Matcher::UrlEncoded("lat".into(), "18.5204".into()),
                Matcher::UrlEncoded("lon".into(), "73.8567".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"address":{"city":"Pune","state_district":"Pune District","state":"Maharashtra"}}"#)
            .create();

        let client = NominatimClient::new(&config_for(&server));
        let hint = client.reverse_geocode(Coordinate::new(18.5204, 73.8567), None).unwrap();
        assert_eq!(hint, Some("Pune".to_string()));
        mock.assert();
    }

    #[test]
    fn test_reverse_geocode_error_body() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/reverse")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Unable to geocode"}"#)
            .create();

        let client = NominatimClient::new(&config_for(&server));
        let result = client.reverse_geocode(Coordinate::new(0.0, 0.0), None);
        assert!(matches!(result, Err(LocationError::NotFound(_))));
    }

    #[test]
    fn test_search_nearby_parses_places() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("countrycodes".into(), "in".into()),
                Matcher::UrlEncoded("limit".into(), "50".into()),
                Matcher::UrlEncoded("bounded".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"lat":"18.6298","lon":"73.7997","name":"Pimpri","address":{"city":"Pimpri-Chinchwad","state":"Maharashtra"}},
                    {"lat":"18.7","lon":"73.9","address":{"village":"Alandi"}},
                    {"name":"Nowhere"}
                ]"#,
            )
            .create();

        let client = NominatimClient::new(&config_for(&server));
        let query = NearbyQuery {
            text: "city".into(),
            center: Coordinate::new(18.5204, 73.8567),
            radius_km: 50.0,
            country_code: "in".into(),
            max_results: 50,
        };
        let places = client.search_nearby(&query, None).unwrap();
        mock.assert();

        assert_eq!(places.len(), 3);
        assert_eq!(places[0].name.as_deref(), Some("Pimpri-Chinchwad"));
        assert_eq!(places[0].position, Some(Coordinate::new(18.6298, 73.7997)));
        assert_eq!(places[1].name.as_deref(), Some("Alandi"));
        assert_eq!(places[2].name.as_deref(), Some("Nowhere"));
        assert_eq!(places[2].position, None);
    }

    #[test]
    fn test_request_timeout_never_exceeds_agent_timeout() {
        let server = Server::new();
        let client = NominatimClient::new(&config_for(&server));
        assert_eq!(client.timeout(None), None);
        assert_eq!(client.timeout(Some(Duration::from_millis(300))), Some(Duration::from_millis(300)));
        assert_eq!(client.timeout(Some(Duration::from_secs(60))), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_slow_response_abandoned_after_remaining_time() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/reverse")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(3));
                w.write_all(br#"{"address":{"city":"Pune"}}"#)
            })
            .create();

        let client = NominatimClient::new(&config_for(&server));
        let started = Instant::now();
        let result = client.reverse_geocode(Coordinate::new(18.5204, 73.8567), Some(Duration::from_millis(300)));
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_geocode_city_empty_is_none() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::UrlEncoded("q".into(), "Atlantis".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create();

        let client = NominatimClient::new(&config_for(&server));
        assert_eq!(client.geocode_city("Atlantis", "in", None).unwrap(), None);
    }

    #[test]
    fn test_http_error_is_network() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(503)
            .create();

        let client = NominatimClient::new(&config_for(&server));
        let result = client.geocode_city("Pune", "in", None);
        assert!(matches!(result, Err(LocationError::Network(_))));
    }

    #[test]
    fn test_malformed_body_is_invalid_response() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>rate limited</html>")
            .create();

        let client = NominatimClient::new(&config_for(&server));
        let result = client.geocode_city("Pune", "in", None);
        assert!(matches!(result, Err(LocationError::InvalidResponse(_))));
    }

    #[test]
    fn test_pincode_success() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/pincode/110001")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"Message":"Number of pincode(s) found:2","Status":"Success","PostOffice":[
                    {"Name":"Connaught Place","District":"Central Delhi","State":"Delhi","Country":"India"},
                    {"Name":"Parliament House","District":"New Delhi","State":"Delhi","Country":"India"}
                ]}]"#,
            )
            .create();

        let client = PincodeClient::new(&config_for(&server));
        let offices = client.lookup("110001").unwrap();
        mock.assert();

        assert_eq!(offices.len(), 2);
        assert_eq!(offices[0].district.as_deref(), Some("Central Delhi"));
        assert_eq!(offices[0].state.as_deref(), Some("Delhi"));
        assert_eq!(offices[0].name.as_deref(), Some("Connaught Place"));
    }

    #[test]
    fn test_pincode_not_found_status() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/pincode/999999")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"Message":"No records found","Status":"Error","PostOffice":null}]"#)
            .create();

        let client = PincodeClient::new(&config_for(&server));
        let result = client.lookup("999999");
        assert!(matches!(result, Err(LocationError::NotFound(code)) if code == "999999"));
    }

    #[test]
    fn test_pincode_empty_array() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/pincode/400001")
            .with_status(200)
            .with_body("[]")
            .create();

        let client = PincodeClient::new(&config_for(&server));
        assert!(matches!(
            client.lookup("400001"),
            Err(LocationError::InvalidResponse(_))
        ));
    }
}
