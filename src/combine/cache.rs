// src/combine/cache.rs
// Memoized file payloads for one repository session.

use std::collections::HashMap;

/// Path -> base64 payload, as returned by `RemoteListing::fetch_file_body`.
///
/// Append-only while a session lasts and cleared as a whole when the session
/// switches repository. No eviction and no size bound: the cache only ever
/// holds files the user picked.
#[derive(Debug, Clone, Default)]
pub struct ContentCache {
    entries: HashMap<String, String>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn put(&mut self, path: impl Into<String>, body: impl Into<String>) {
        self.entries.insert(path.into(), body.into());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_put() {
        let mut cache = ContentCache::new();
        assert!(cache.get("a.txt").is_none());

        cache.put("a.txt", "aGk=");
        assert_eq!(cache.get("a.txt"), Some("aGk="));
        assert!(cache.contains("a.txt"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
