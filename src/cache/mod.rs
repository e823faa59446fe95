//! Language detection cache.
//!
//! Detecting the language of a review is the expensive step of building a
//! language breakdown. Detections are cached per (app id, review id), so a
//! re-run over the same reviews only detects what is new.
//!
//! The cache is a collaborator passed in by the caller, never global state:
//! - [`MemoryCache`]: process-local, for tests and one-off runs
//! - [`RedbDetectionCache`]: persistent, buffered writes, explicit `flush`

mod memory;
mod store;

pub use memory::MemoryCache;
pub use store::{CacheStats, RedbDetectionCache};

use crate::error::Result;

/// Cache key: one review of one app.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DetectionKey {
    pub app_id: String,
    pub review_id: String,
}

impl DetectionKey {
    pub fn new(app_id: impl Into<String>, review_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            review_id: review_id.into(),
        }
    }

    /// Flat form used as the persistent key.
    pub fn encoded(&self) -> String {
        format!("{}/{}", self.app_id, self.review_id)
    }
}

/// Store of detected review languages.
pub trait DetectionCache {
    fn get(&self, key: &DetectionKey) -> Option<String>;

    fn insert(&mut self, key: DetectionKey, language: String);

    /// Persist buffered detections. A no-op for in-memory caches.
    fn flush(&mut self) -> Result<()>;

    /// Cached detection, or run `compute` and remember its answer.
    fn get_or_compute(&mut self, key: &DetectionKey, compute: &mut dyn FnMut() -> String) -> String {
        if let Some(language) = self.get(key) {
            return language;
        }
        let language = compute();
        self.insert(key.clone(), language.clone());
        language
    }
}
