//! The fixed reference list of canonical states and cities.
//!
//! Loaded once per process and never mutated. Entries are compared through
//! [`normalize`], so every list is checked for blank, untrimmed and
//! duplicate-after-normalization entries at construction.

use super::normalize::{loosely_matches, normalize};
use super::types::LocationError;
use std::collections::HashSet;
use std::sync::OnceLock;

// ─── Built-in dataset ───────────────────────────────────────────

const INDIA_STATES: &[&str] = &[
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
    "Andaman and Nicobar Islands",
    "Chandigarh",
    "Dadra and Nagar Haveli and Daman and Diu",
    "Delhi",
    "Jammu and Kashmir",
    "Ladakh",
    "Lakshadweep",
    "Puducherry",
];

const INDIA_CITIES: &[&str] = &[
    "Mumbai",
    "Delhi",
    "New Delhi",
    "Bengaluru",
    "Hyderabad",
    "Ahmedabad",
    "Chennai",
    "Kolkata",
    "Surat",
    "Pune",
    "Jaipur",
    "Lucknow",
    "Kanpur",
    "Nagpur",
    "Indore",
    "Thane",
    "Bhopal",
    "Visakhapatnam",
    "Patna",
    "Vadodara",
    "Ghaziabad",
    "Ludhiana",
    "Agra",
    "Nashik",
    "Faridabad",
    "Meerut",
    "Rajkot",
    "Varanasi",
    "Srinagar",
    "Aurangabad",
    "Dhanbad",
    "Amritsar",
    "Navi Mumbai",
    "Prayagraj",
    "Ranchi",
    "Howrah",
    "Coimbatore",
    "Jabalpur",
    "Gwalior",
    "Vijayawada",
    "Jodhpur",
    "Madurai",
    "Raipur",
    "Kota",
    "Guwahati",
    "Chandigarh",
    "Solapur",
    "Bareilly",
    "Moradabad",
    "Mysuru",
    "Gurugram",
    "Aligarh",
    "Jalandhar",
    "Tiruchirappalli",
    "Bhubaneswar",
    "Salem",
    "Warangal",
    "Thiruvananthapuram",
    "Bhiwandi",
    "Saharanpur",
    "Gorakhpur",
    "Guntur",
    "Bikaner",
    "Amravati",
    "Noida",
    "Jamshedpur",
    "Bhilai",
    "Cuttack",
    "Kochi",
    "Udaipur",
    "Bhavnagar",
    "Dehradun",
    "Asansol",
    "Nanded",
    "Kolhapur",
    "Ajmer",
    "Gulbarga",
    "Jamnagar",
    "Ujjain",
    "Siliguri",
    "Jhansi",
    "Jammu",
    "Mangaluru",
    "Erode",
    "Belagavi",
    "Tirunelveli",
    "Gaya",
    "Jalgaon",
    "Tiruppur",
    "Davanagere",
    "Kozhikode",
    "Akola",
    "Kurnool",
    "Bokaro",
    "Bellary",
    "Patiala",
    "Agartala",
    "Bhagalpur",
    "Latur",
    "Dhule",
    "Korba",
    "Bhilwara",
    "Brahmapur",
    "Muzaffarpur",
    "Ahmednagar",
    "Mathura",
    "Kollam",
    "Bilaspur",
    "Shahjahanpur",
    "Satara",
    "Bijapur",
    "Rampur",
    "Shivamogga",
    "Junagadh",
    "Thrissur",
    "Alwar",
    "Bardhaman",
    "Nellore",
    "Puducherry",
    "Shimla",
    "Panaji",
    "Imphal",
    "Shillong",
    "Aizawl",
    "Kohima",
    "Itanagar",
    "Gangtok",
    "Port Blair",
    "Silvassa",
    "Leh",
    "Kavaratti",
    "Hubballi",
    "Sangli",
    "Pimpri-Chinchwad",
    "Vasai-Virar",
    "Kalyan-Dombivli",
    "Panvel",
    "Ratnagiri",
    "Karnal",
    "Panipat",
    "Rohtak",
    "Hisar",
    "Sonipat",
];

static INDIA: OnceLock<Gazetteer> = OnceLock::new();

/// One list of names plus their normalized forms, index-aligned.
#[derive(Debug, Clone)]
struct PlaceList {
    names: Vec<String>,
    normalized: Vec<String>,
}

impl PlaceList {
    fn build(kind: &str, names: Vec<String>) -> Result<Self, LocationError> {
        let mut seen = HashSet::with_capacity(names.len());
        let mut normalized = Vec::with_capacity(names.len());
        for name in &names {
            if name.trim().is_empty() {
                return Err(LocationError::InvalidGazetteer(format!("blank {} entry", kind)));
            }
            if name.trim() != name {
                return Err(LocationError::InvalidGazetteer(format!(
                    "{} entry '{}' is not trimmed",
                    kind, name
                )));
            }
            let key = normalize(name);
            if !seen.insert(key.clone()) {
                return Err(LocationError::InvalidGazetteer(format!(
                    "duplicate {} entry '{}'",
                    kind, name
                )));
            }
            normalized.push(key);
        }
        Ok(Self { names, normalized })
    }

    fn find_exact(&self, key: &str) -> Option<&str> {
        self.normalized
            .iter()
            .position(|n| n == key)
            .map(|i| self.names[i].as_str())
    }

    /// An exact entry wins; otherwise the first loose match in list order.
    fn find_loose(&self, key: &str) -> Option<&str> {
        self.find_exact(key).or_else(|| {
            self.normalized
                .iter()
                .position(|n| loosely_matches(n, key))
                .map(|i| self.names[i].as_str())
        })
    }
}

/// Canonical place names for a single country.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    country_code: String,
    country_name: String,
    postal_code_len: usize,
    states: PlaceList,
    cities: PlaceList,
}

impl Gazetteer {
    /// Build a gazetteer, rejecting blank, untrimmed or duplicate entries.
    pub fn new(
        country_code: &str,
        country_name: &str,
        postal_code_len: usize,
        states: Vec<String>,
        cities: Vec<String>,
    ) -> Result<Self, LocationError> {
        Ok(Self {
            country_code: country_code.to_lowercase(),
            country_name: country_name.to_string(),
            postal_code_len,
            states: PlaceList::build("state", states)?,
            cities: PlaceList::build("city", cities)?,
        })
    }

    /// The built-in Indian gazetteer, shared process-wide.
    pub fn india() -> &'static Gazetteer {
        INDIA.get_or_init(|| {
            let states = INDIA_STATES.iter().map(|s| s.to_string()).collect();
            let cities = INDIA_CITIES.iter().map(|s| s.to_string()).collect();
            match Gazetteer::new("in", "India", 6, states, cities) {
                Ok(g) => g,
                // Constant lists, checked by tests.
                Err(e) => unreachable!("built-in gazetteer is invalid: {}", e),
            }
        })
    }

    /// ISO 3166-1 alpha-2 code, lowercase (as Nominatim's `countrycodes` expects).
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn country_name(&self) -> &str {
        &self.country_name
    }

    /// Number of digits in a postal code.
    pub fn postal_code_len(&self) -> usize {
        self.postal_code_len
    }

    pub fn states(&self) -> &[String] {
        &self.states.names
    }

    pub fn cities(&self) -> &[String] {
        &self.cities.names
    }

    /// Canonical spelling of a state, if `input` names one.
    pub fn find_state(&self, input: &str) -> Option<&str> {
        self.states.find_exact(&normalize(input))
    }

    /// Canonical spelling of a city, if `input` names one.
    pub fn find_city(&self, input: &str) -> Option<&str> {
        self.cities.find_exact(&normalize(input))
    }

    /// The city named exactly by `input`, else the first city (in gazetteer
    /// order) where either name contains the other.
    pub fn match_city_loosely(&self, input: &str) -> Option<&str> {
        self.cities.find_loose(&normalize(input))
    }
}
