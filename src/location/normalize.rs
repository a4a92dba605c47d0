//! String normalization shared by every matching operation.

/// Trim, collapse internal whitespace runs to one space, and lowercase.
pub fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Substring match in either direction on already-normalized names.
///
/// Tolerates suffixes such as "district" or "rural" on geocoder output.
/// Empty names never match.
pub fn loosely_matches(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(b) || b.contains(a)
}
