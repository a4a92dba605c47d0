//! File-based postal-code cache at ~/.locality/pincodes.json.
//!
//! TTL: 30 days. Keys are the trimmed postal code. A missing or corrupt
//! file is treated as an empty cache.

use super::types::ResolvedLocation;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const CACHE_TTL_MS: i64 = 30 * 24 * 3600 * 1000; // 30 days in ms

#[derive(Serialize, Deserialize, Clone)]
struct CacheEntry {
    state: String,
    city: String,
    #[serde(default)]
    address: String,
    timestamp: i64,
}

/// The postal-code cache.
pub struct PostalCache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl PostalCache {
    /// Load cache from the default location (~/.locality/pincodes.json).
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load cache from a specific path.
    pub fn load_from(path: PathBuf) -> Self {
        let entries = Self::read_file(&path).unwrap_or_default();
        Self { path, entries }
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".locality")
            .join("pincodes.json")
    }

    fn read_file(path: &Path) -> Option<HashMap<String, CacheEntry>> {
        let data = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&data) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!("Ignoring unreadable postal cache {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Look up a code. Returns None if missing or expired.
    pub fn get(&self, code: &str) -> Option<ResolvedLocation> {
        let entry = self.entries.get(code.trim())?;

        let now = chrono::Utc::now().timestamp_millis();
        if now - entry.timestamp > CACHE_TTL_MS {
            return None; // expired
        }

        Some(ResolvedLocation {
            state: entry.state.clone(),
            city: entry.city.clone(),
            address: entry.address.clone(),
        })
    }

    /// Store a resolution and persist to disk.
    pub fn put(&mut self, code: &str, resolved: &ResolvedLocation) {
        let entry = CacheEntry {
            state: resolved.state.clone(),
            city: resolved.city.clone(),
            address: resolved.address.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        self.entries.insert(code.trim().to_string(), entry);
        self.persist();
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Cannot create cache directory {}: {}", parent.display(), e);
                return;
            }
        }
        match serde_json::to_string_pretty(&self.entries) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!("Cannot write postal cache {}: {}", self.path.display(), e);
                }
            }
            Err(e) => warn!("Cannot serialize postal cache: {}", e),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_cache() -> (PostalCache, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pincodes.json");
        (PostalCache::load_from(path), dir)
    }

    fn delhi() -> ResolvedLocation {
        ResolvedLocation {
            state: "Delhi".into(),
            city: "Central Delhi".into(),
            address: "Connaught Place, Central Delhi, Delhi".into(),
        }
    }

    #[test]
    fn test_cache_put_get() {
        let (mut cache, _dir) = test_cache();
        cache.put("110001", &delhi());

        assert_eq!(cache.get("110001"), Some(delhi()));
        assert_eq!(cache.get(" 110001 "), Some(delhi()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_load_uses_default_path() {
        let cache = PostalCache::load();
        assert_eq!(cache.path, PostalCache::default_path());
        assert!(cache.path.ends_with(".locality/pincodes.json"));
    }

    #[test]
    fn test_cache_miss() {
        let (cache, _dir) = test_cache();
        assert!(cache.get("560001").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("pincodes.json");

        {
            let mut cache = PostalCache::load_from(path.clone());
            cache.put("110001", &delhi());
        }

        let cache2 = PostalCache::load_from(path);
        assert_eq!(cache2.get("110001").unwrap().city, "Central Delhi");
    }

    #[test]
    fn test_expired_entry_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pincodes.json");
        let old_json = r#"{
            "411001": {
                "state": "Maharashtra",
                "city": "Pune",
                "timestamp": 0
            }
        }"#;
        fs::write(&path, old_json).unwrap();

        let cache = PostalCache::load_from(path);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("411001").is_none());
    }

    #[test]
    fn test_missing_address_defaults_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pincodes.json");
        let json = r#"{"411001": {"state": "Maharashtra", "city": "Pune", "timestamp": 9999999999999}}"#;
        fs::write(&path, json).unwrap();

        let cache = PostalCache::load_from(path);
        let loc = cache.get("411001").unwrap();
        assert_eq!(loc.address, "");
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pincodes.json");
        fs::write(&path, "{not json").unwrap();

        let cache = PostalCache::load_from(path);
        assert!(cache.is_empty());
    }
}
