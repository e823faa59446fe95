//! Per-language vote sub-counts built from raw reviews.
//!
//! A review counts towards language `L` when its detected language is `L`.
//! The languages considered for an app are the normalized tags of its
//! reviews; a tag the lookup table does not know is resolved by majority vote
//! over the detected languages of the reviews carrying it.
//!
//! Detection itself is a collaborator ([`LanguageDetector`]); every detection
//! goes through a [`DetectionCache`] keyed by (app id, review id).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::language::normalize_or_vote;
use crate::cache::{DetectionCache, DetectionKey};
use crate::catalog::Catalog;
use crate::error::Result;
use crate::types::VoteCounts;

/// Detected language of a review whose text could not be classified.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// One user review, as returned by the store's review endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "recommendationid")]
    pub review_id: String,
    /// Store language tag (`english`, `schinese`, ...).
    pub language: String,
    pub voted_up: bool,
    #[serde(rename = "review", default)]
    pub text: String,
}

/// Detects the language of a review's text.
pub trait LanguageDetector: Send + Sync {
    /// ISO 639-1 code, or `None` when the text cannot be classified.
    fn detect(&self, review: &Review) -> Option<String>;
}

/// Detector that trusts the store language tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagDetector;

impl LanguageDetector for TagDetector {
    fn detect(&self, review: &Review) -> Option<String> {
        super::language::normalize_language_code(&review.language).ok()
    }
}

/// Language code -> vote sub-counts for one app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageBreakdown {
    counts: BTreeMap<String, VoteCounts>,
}

impl LanguageBreakdown {
    pub fn from_reviews(
        app_id: &str,
        reviews: &[Review],
        detector: &dyn LanguageDetector,
        cache: &mut dyn DetectionCache,
    ) -> Result<Self> {
        let detected: Vec<String> = reviews
            .iter()
            .map(|review| {
                let key = DetectionKey::new(app_id, review.review_id.as_str());
                cache.get_or_compute(&key, &mut || {
                    detector
                        .detect(review)
                        .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string())
                })
            })
            .collect();

        let tags: BTreeSet<&str> = reviews.iter().map(|r| r.language.as_str()).collect();

        let mut languages = BTreeSet::new();
        for tag in tags {
            let votes = reviews
                .iter()
                .zip(&detected)
                .filter(|(r, _)| r.language == tag)
                .map(|(_, d)| d.as_str());
            match normalize_or_vote(tag, votes) {
                Ok(code) => {
                    languages.insert(code);
                }
                Err(e) => warn!(app = app_id, tag, "{e}; tag skipped"),
            }
        }

        let counts = languages
            .into_iter()
            .map(|code| {
                let votes = reviews
                    .iter()
                    .zip(&detected)
                    .filter(|(_, d)| **d == code)
                    .fold(VoteCounts::default(), |acc, (r, _)| {
                        acc + if r.voted_up {
                            VoteCounts::new(1, 0)
                        } else {
                            VoteCounts::new(0, 1)
                        }
                    });
                (code, votes)
            })
            .collect();

        Ok(Self { counts })
    }

    pub fn get(&self, code: &str) -> Option<VoteCounts> {
        self.counts.get(code).copied()
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn into_map(self) -> BTreeMap<String, VoteCounts> {
        self.counts
    }
}

/// Breakdowns for many apps, flushing the cache every `flush_every` apps and
/// once at the end.
pub fn summarize_reviews<I>(
    apps: I,
    detector: &dyn LanguageDetector,
    cache: &mut dyn DetectionCache,
    flush_every: usize,
) -> Result<BTreeMap<String, LanguageBreakdown>>
where
    I: IntoIterator<Item = (String, Vec<Review>)>,
{
    let flush_every = flush_every.max(1);
    let mut summaries = BTreeMap::new();

    for (done, (app_id, reviews)) in apps.into_iter().enumerate() {
        let breakdown = LanguageBreakdown::from_reviews(&app_id, &reviews, detector, cache)?;
        debug!(app = %app_id, reviews = reviews.len(), languages = breakdown.counts.len(), "summarized");
        summaries.insert(app_id, breakdown);

        if (done + 1) % flush_every == 0 {
            cache.flush()?;
        }
    }

    cache.flush()?;
    Ok(summaries)
}

/// Catalog with each listed app's breakdown replaced.
pub fn attach_breakdowns(catalog: &Catalog, breakdowns: BTreeMap<String, LanguageBreakdown>) -> Catalog {
    let mut breakdowns = breakdowns;
    Catalog::from_items(catalog.iter().cloned().map(|mut item| {
        if let Some(b) = breakdowns.remove(&item.id) {
            item.languages = b.into_map();
        }
        item
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::types::Item;

    fn review(id: &str, tag: &str, up: bool) -> Review {
        Review {
            review_id: id.into(),
            language: tag.into(),
            voted_up: up,
            text: String::new(),
        }
    }

    /// Detection table keyed by review id.
    struct Fixed(BTreeMap<&'static str, &'static str>);

    impl LanguageDetector for Fixed {
        fn detect(&self, review: &Review) -> Option<String> {
            self.0.get(review.review_id.as_str()).map(|s| s.to_string())
        }
    }

    #[test]
    fn test_counts_only_matching_detections() {
        let reviews = vec![
            review("1", "english", true),
            review("2", "english", false),
            review("3", "english", true),
            review("4", "french", true),
        ];
        // Review 3 is tagged english but written in french
        let detector = Fixed(BTreeMap::from([("1", "en"), ("2", "en"), ("3", "fr"), ("4", "fr")]));
        let mut cache = MemoryCache::new();

        let b = LanguageBreakdown::from_reviews("10", &reviews, &detector, &mut cache).unwrap();
        assert_eq!(b.get("en"), Some(VoteCounts::new(1, 1)));
        assert_eq!(b.get("fr"), Some(VoteCounts::new(2, 0)));
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_unknown_tag_majority_vote() {
        let reviews = vec![review("1", "klingon", true), review("2", "klingon", true)];
        let detector = Fixed(BTreeMap::from([("1", "de"), ("2", "de")]));
        let mut cache = MemoryCache::new();

        let b = LanguageBreakdown::from_reviews("10", &reviews, &detector, &mut cache).unwrap();
        assert_eq!(b.languages().collect::<Vec<_>>(), vec!["de"]);
        assert_eq!(b.get("de"), Some(VoteCounts::new(2, 0)));
    }

    #[test]
    fn test_undetectable_reviews_count_nowhere() {
        let reviews = vec![review("1", "english", true), review("2", "english", true)];
        let detector = Fixed(BTreeMap::from([("1", "en")]));
        let mut cache = MemoryCache::new();

        let b = LanguageBreakdown::from_reviews("10", &reviews, &detector, &mut cache).unwrap();
        assert_eq!(b.get("en"), Some(VoteCounts::new(1, 0)));
        assert_eq!(
            cache.get(&DetectionKey::new("10", "2")).as_deref(),
            Some(UNKNOWN_LANGUAGE)
        );
    }

    /// Memory cache that counts flushes.
    #[derive(Default)]
    struct Counting {
        inner: MemoryCache,
        flushes: usize,
    }

    impl DetectionCache for Counting {
        fn get(&self, key: &DetectionKey) -> Option<String> {
            self.inner.get(key)
        }
        fn insert(&mut self, key: DetectionKey, language: String) {
            self.inner.insert(key, language)
        }
        fn flush(&mut self) -> Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_summarize_flush_cadence() {
        let apps: Vec<_> = (0..5)
            .map(|i| (i.to_string(), vec![review(&format!("r{i}"), "english", true)]))
            .collect();
        let mut cache = Counting::default();

        let summaries = summarize_reviews(apps, &TagDetector, &mut cache, 2).unwrap();
        assert_eq!(summaries.len(), 5);
        // After apps 2 and 4, then once at the end
        assert_eq!(cache.flushes, 3);
        assert_eq!(summaries["3"].get("en"), Some(VoteCounts::new(1, 0)));
    }

    #[test]
    fn test_attach_breakdowns() {
        let catalog = Catalog::from_items(vec![
            Item::new("1", "One", VoteCounts::new(5, 0)),
            Item::new("2", "Two", VoteCounts::new(5, 0)),
        ]);
        let reviews = vec![review("a", "russian", false)];
        let b = LanguageBreakdown::from_reviews("1", &reviews, &TagDetector, &mut MemoryCache::new()).unwrap();

        let updated = attach_breakdowns(&catalog, BTreeMap::from([("1".to_string(), b)]));
        assert_eq!(updated.get("1").unwrap().languages["ru"], VoteCounts::new(0, 1));
        assert!(updated.get("2").unwrap().languages.is_empty());
    }

    #[test]
    fn test_review_json_field_names() {
        let r: Review = serde_json::from_str(
            r#"{"recommendationid": "77", "language": "schinese", "voted_up": false, "review": "好"}"#,
        )
        .unwrap();
        assert_eq!(r.review_id, "77");
        assert_eq!(TagDetector.detect(&r).as_deref(), Some("zh-cn"));
    }
}
