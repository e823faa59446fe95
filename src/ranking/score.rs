//! Score function and per-item signals.
//!
//! ```text
//! score = quality × alpha / (alpha + popularity)
//! ```
//!
//! The decay factor is 1 at zero popularity, exactly 0.5 at
//! `popularity == alpha`, and tends to 0 for blockbusters. Sentinel
//! popularity (negative) is clamped to zero inside the decay term, so the
//! function is finite for every alpha > 0.

use tracing::warn;

use crate::catalog::Catalog;
use crate::quality::QualityEstimator;
use crate::types::{
    Item, ItemSignal, PopularityMeasure, SignalFlag, VoteCounts, VoteScope, NO_VOTES_SENTINEL,
};

/// Popularity decay factor in (0, 1].
pub fn decay(popularity: f64, alpha: f64) -> f64 {
    alpha / (alpha + popularity.max(0.0))
}

/// Rank key of one item.
pub fn score(quality: f64, popularity: f64, alpha: f64) -> f64 {
    quality * decay(popularity, alpha)
}

/// Largest popularity value across signals (sentinels ignored, 0 if empty).
pub fn max_popularity(signals: &[ItemSignal]) -> f64 {
    signals.iter().map(|s| s.popularity).fold(0.0, f64::max)
}

/// Turns catalog items into quality/popularity signals for one scope.
pub struct SignalBuilder {
    estimator: QualityEstimator,
    popularity: PopularityMeasure,
}

impl SignalBuilder {
    pub fn new(estimator: QualityEstimator, popularity: PopularityMeasure) -> Self {
        Self { estimator, popularity }
    }

    /// One signal per catalog item, in catalog (id) order.
    pub fn build(&self, catalog: &Catalog, scope: &VoteScope) -> Vec<ItemSignal> {
        let mut inconsistent = 0usize;
        let signals: Vec<_> = catalog
            .iter()
            .map(|item| {
                let signal = match scope {
                    VoteScope::Overall => self.overall(item),
                    VoteScope::Language(code) => self.regional(item, code),
                };
                if signal.flag == SignalFlag::InconsistentEstimate {
                    inconsistent += 1;
                }
                signal
            })
            .collect();

        if inconsistent > 0 {
            warn!(
                language = scope.label(),
                items = inconsistent,
                "regional players estimate below regional reviews; items demoted to sentinel"
            );
        }
        signals
    }

    fn overall(&self, item: &Item) -> ItemSignal {
        let popularity = match self.popularity {
            PopularityMeasure::Players => item.players as f64,
            PopularityMeasure::Reviews => item.votes.total() as f64,
        };
        self.signal(item, item.votes, popularity)
    }

    /// Players in a language are estimated by splitting total players in
    /// proportion to the language's share of the item's reviews.
    fn regional(&self, item: &Item, code: &str) -> ItemSignal {
        let votes = item.languages.get(code).copied().unwrap_or_default();
        let reviews = votes.total() as f64;
        let breakdown_total = item.breakdown_total();

        let players = if breakdown_total > 0 {
            item.players as f64 * reviews / breakdown_total as f64
        } else {
            0.0
        };

        if players < reviews {
            warn!(
                item = %item.id,
                language = code,
                players,
                reviews,
                "inconsistent regional estimate"
            );
            return ItemSignal {
                id: item.id.clone(),
                name: item.name.clone(),
                quality: NO_VOTES_SENTINEL,
                popularity: NO_VOTES_SENTINEL,
                include_in_output: item.include_in_output,
                flag: SignalFlag::InconsistentEstimate,
            };
        }

        let popularity = match self.popularity {
            PopularityMeasure::Players => players,
            PopularityMeasure::Reviews => reviews,
        };
        self.signal(item, votes, popularity)
    }

    fn signal(&self, item: &Item, votes: VoteCounts, popularity: f64) -> ItemSignal {
        let (quality, flag) = match self.estimator.estimate(votes) {
            Some(q) => (q, SignalFlag::Scored),
            None => (NO_VOTES_SENTINEL, SignalFlag::NoVotes),
        };
        ItemSignal {
            id: item.id.clone(),
            name: item.name.clone(),
            quality,
            popularity,
            include_in_output: item.include_in_output,
            flag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::DEFAULT_CONFIDENCE;

    fn wilson() -> QualityEstimator {
        QualityEstimator::LowerConfidenceBound { confidence: DEFAULT_CONFIDENCE }
    }

    #[test]
    fn test_half_decay_at_alpha() {
        for alpha in [1.0, 100.0, 2.5e6] {
            for quality in [0.0, 0.3, 1.0, NO_VOTES_SENTINEL] {
                assert_eq!(score(quality, alpha, alpha), quality * 0.5);
            }
        }
    }

    #[test]
    fn test_monotone_in_popularity() {
        let alpha = 1_000.0;
        let mut last = f64::INFINITY;
        for popularity in [0.0, 1.0, 10.0, 999.0, 1e4, 1e7] {
            let s = score(0.8, popularity, alpha);
            assert!(s <= last);
            last = s;
        }
    }

    #[test]
    fn test_monotone_in_quality() {
        let low = score(0.2, 500.0, 100.0);
        let high = score(0.9, 500.0, 100.0);
        assert!(high >= low);
    }

    #[test]
    fn test_sentinel_popularity_stays_finite() {
        let s = score(NO_VOTES_SENTINEL, NO_VOTES_SENTINEL, 1.0);
        assert_eq!(s, NO_VOTES_SENTINEL);
    }

    #[test]
    fn test_overall_signals() {
        let catalog = Catalog::from_items(vec![
            Item::new("a", "A", VoteCounts::new(10, 0)).with_players(50),
            Item::new("b", "B", VoteCounts::default()).with_players(5),
        ]);

        let by_players = SignalBuilder::new(wilson(), PopularityMeasure::Players)
            .build(&catalog, &VoteScope::Overall);
        assert_eq!(by_players[0].popularity, 50.0);
        assert_eq!(by_players[0].flag, SignalFlag::Scored);
        assert_eq!(by_players[1].quality, NO_VOTES_SENTINEL);
        assert_eq!(by_players[1].flag, SignalFlag::NoVotes);

        let by_reviews = SignalBuilder::new(wilson(), PopularityMeasure::Reviews)
            .build(&catalog, &VoteScope::Overall);
        assert_eq!(by_reviews[0].popularity, 10.0);
    }

    #[test]
    fn test_regional_split() {
        let item = Item::new("a", "A", VoteCounts::new(100, 0))
            .with_players(1_000)
            .with_language("en", VoteCounts::new(30, 0))
            .with_language("fr", VoteCounts::new(10, 0));
        let catalog = Catalog::from_items(vec![item]);

        let signals = SignalBuilder::new(wilson(), PopularityMeasure::Players)
            .build(&catalog, &VoteScope::Language("en".into()));
        assert!((signals[0].popularity - 750.0).abs() < 1e-9);
        assert_eq!(signals[0].flag, SignalFlag::Scored);

        let absent = SignalBuilder::new(wilson(), PopularityMeasure::Players)
            .build(&catalog, &VoteScope::Language("de".into()));
        assert_eq!(absent[0].flag, SignalFlag::NoVotes);
        assert_eq!(absent[0].popularity, 0.0);
    }

    #[test]
    fn test_regional_inconsistent_estimate() {
        // 20 players split over 40 reviews: fewer players than reviews in "en"
        let item = Item::new("a", "A", VoteCounts::new(40, 0))
            .with_players(20)
            .with_language("en", VoteCounts::new(30, 0))
            .with_language("fr", VoteCounts::new(10, 0));
        let catalog = Catalog::from_items(vec![item]);

        let signals = SignalBuilder::new(wilson(), PopularityMeasure::Reviews)
            .build(&catalog, &VoteScope::Language("en".into()));
        assert_eq!(signals[0].flag, SignalFlag::InconsistentEstimate);
        assert_eq!(signals[0].quality, NO_VOTES_SENTINEL);
        assert_eq!(signals[0].popularity, NO_VOTES_SENTINEL);
    }

    #[test]
    fn test_max_popularity_ignores_sentinels() {
        let signals = vec![
            ItemSignal::new("a", 0.5, NO_VOTES_SENTINEL),
            ItemSignal::new("b", 0.5, 42.0),
        ];
        assert_eq!(max_popularity(&signals), 42.0);
        assert_eq!(max_popularity(&[]), 0.0);
    }
}
