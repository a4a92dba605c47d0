//! Live validation and autocomplete against the gazetteer.

use super::gazetteer::Gazetteer;
use super::normalize::normalize;

/// Minimum trimmed input length before suggestions are offered.
pub const MIN_SUGGEST_CHARS: usize = 2;

/// Membership tests and suggestions over one gazetteer.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'g> {
    gazetteer: &'g Gazetteer,
}

impl<'g> Validator<'g> {
    pub fn new(gazetteer: &'g Gazetteer) -> Self {
        Self { gazetteer }
    }

    pub fn is_valid_state(&self, input: &str) -> bool {
        self.canonical_state(input).is_some()
    }

    pub fn is_valid_city(&self, input: &str) -> bool {
        self.canonical_city(input).is_some()
    }

    /// The gazetteer spelling of a valid state name.
    pub fn canonical_state(&self, input: &str) -> Option<&'g str> {
        if input.trim().is_empty() {
            return None;
        }
        self.gazetteer.find_state(input)
    }

    /// The gazetteer spelling of a valid city name.
    pub fn canonical_city(&self, input: &str) -> Option<&'g str> {
        if input.trim().is_empty() {
            return None;
        }
        self.gazetteer.find_city(input)
    }

    pub fn suggest_states(&self, input: &str, limit: usize) -> Vec<String> {
        suggest(self.gazetteer.states(), input, limit)
    }

    pub fn suggest_cities(&self, input: &str, limit: usize) -> Vec<String> {
        suggest(self.gazetteer.cities(), input, limit)
    }
}

/// Up to `limit` entries of `list` whose normalized form contains the
/// normalized input, in list order. Inputs shorter than two characters
/// (after trimming) yield nothing.
pub fn suggest<S: AsRef<str>>(list: &[S], input: &str, limit: usize) -> Vec<String> {
    if input.trim().chars().count() < MIN_SUGGEST_CHARS {
        return Vec::new();
    }
    let needle = normalize(input);

    list.iter()
        .map(AsRef::as_ref)
        .filter(|entry| normalize(entry).contains(&needle))
        .take(limit)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator<'static> {
        Validator::new(Gazetteer::india())
    }

    #[test]
    fn test_state_case_and_whitespace_insensitive() {
        let v = validator();
        assert!(v.is_valid_state("maharashtra"));
        assert!(v.is_valid_state(" Maharashtra "));
        assert!(v.is_valid_state("MAHARASHTRA"));
        assert!(v.is_valid_state("tamil    nadu"));
    }

    #[test]
    fn test_state_rejects_empty_and_unknown() {
        let v = validator();
        assert!(!v.is_valid_state(""));
        assert!(!v.is_valid_state("   "));
        assert!(!v.is_valid_state("Maharash"));
        assert!(!v.is_valid_state("California"));
    }

    #[test]
    fn test_city_validation() {
        let v = validator();
        assert!(v.is_valid_city("pune"));
        assert!(v.is_valid_city(" NAVI  mumbai "));
        assert!(!v.is_valid_city(""));
        assert!(!v.is_valid_city("Pune District"));
    }

    #[test]
    fn test_canonical_spelling() {
        let v = validator();
        assert_eq!(v.canonical_state("west bengal"), Some("West Bengal"));
        assert_eq!(v.canonical_city("BENGALURU"), Some("Bengaluru"));
        assert_eq!(v.canonical_city("\t"), None);
    }

    #[test]
    fn test_suggest_cities() {
        let v = validator();
        let hits = v.suggest_cities("ben", 5);
        assert!(!hits.is_empty());
        assert!(hits.contains(&"Bengaluru".to_string()));
    }

    #[test]
    fn test_suggest_too_short() {
        let v = validator();
        assert!(v.suggest_cities("b", 5).is_empty());
        assert!(v.suggest_cities(" b  ", 5).is_empty());
        assert!(v.suggest_states("", 5).is_empty());
    }

    #[test]
    fn test_suggest_limit_and_order() {
        let list = ["Alpha", "beta", "Alphabet", "ALPINE", "alps"];
        assert_eq!(suggest(&list, "al", 3), vec!["Alpha", "Alphabet", "ALPINE"]);
        assert_eq!(suggest(&list, "AL", 10).len(), 4);
        assert!(suggest(&list, "al", 0).is_empty());
    }

    #[test]
    fn test_suggest_substring_not_prefix() {
        let list = ["Navi Mumbai", "Mumbai"];
        assert_eq!(suggest(&list, "mumbai", 5), vec!["Navi Mumbai", "Mumbai"]);
    }

    #[test]
    fn test_shared_across_threads() {
        let g = Gazetteer::india();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let v = Validator::new(g);
                    assert!(v.is_valid_state("Kerala"));
                    assert_eq!(v.suggest_states("pradesh", 10).len(), 5);
                });
            }
        });
    }
}
