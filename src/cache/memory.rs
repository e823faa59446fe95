use std::collections::HashMap;

use super::{DetectionCache, DetectionKey};
use crate::error::Result;

/// In-process detection cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<DetectionKey, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DetectionCache for MemoryCache {
    fn get(&self, key: &DetectionKey) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: DetectionKey, language: String) {
        self.entries.insert(key, language);
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_compute_runs_once() {
        let mut cache = MemoryCache::new();
        let key = DetectionKey::new("10", "r1");
        let mut calls = 0;

        for _ in 0..3 {
            let lang = cache.get_or_compute(&key, &mut || {
                calls += 1;
                "fr".to_string()
            });
            assert_eq!(lang, "fr");
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }
}
