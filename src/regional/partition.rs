//! Per-language rankings.
//!
//! Each language runs the full pipeline on its own: quality from that
//! language's vote sub-counts, players split in proportion to the language's
//! share of reviews, its own prior, its own alpha. Languages share nothing but
//! the read-only catalog, so they can be ranked in parallel; results land in a
//! `BTreeMap` so the output order never depends on scheduling.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{GemError, Result};
use crate::ranking::{RankingRun, RunOutcome};
use crate::types::VoteScope;

/// Language code -> independent ranking run.
#[derive(Debug, Clone, Default)]
pub struct RegionalView {
    pub runs: BTreeMap<String, RunOutcome>,
    /// Languages skipped because no prior could be fitted, with the reason.
    pub skipped: BTreeMap<String, String>,
}

impl RegionalView {
    pub fn get(&self, code: &str) -> Option<&RunOutcome> {
        self.runs.get(code)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.runs.keys().map(String::as_str)
    }
}

pub struct RegionalPartitioner<'a> {
    config: &'a Config,
    catalog: &'a Catalog,
    whole_catalog: &'a Catalog,
    alpha: Option<f64>,
}

impl<'a> RegionalPartitioner<'a> {
    pub fn new(config: &'a Config, catalog: &'a Catalog) -> Self {
        Self {
            config,
            catalog,
            whole_catalog: catalog,
            alpha: None,
        }
    }

    pub fn with_whole_catalog(mut self, whole_catalog: &'a Catalog) -> Self {
        self.whole_catalog = whole_catalog;
        self
    }

    /// Use one fixed alpha for every language.
    pub fn with_alpha(mut self, alpha: Option<f64>) -> Self {
        self.alpha = alpha;
        self
    }

    fn run_one(&self, code: &str) -> Result<RunOutcome> {
        RankingRun::new(self.config, self.catalog)
            .with_whole_catalog(self.whole_catalog)
            .with_alpha(self.alpha)
            .run(&VoteScope::Language(code.to_string()))
    }

    /// Rank every configured language.
    ///
    /// A language whose prior cannot be fitted is skipped with a warning; any
    /// other error aborts the whole partition.
    pub fn partition(&self) -> Result<RegionalView> {
        let languages = &self.config.languages;
        let results: Vec<(String, Result<RunOutcome>)> = if self.config.parallel_regions {
            languages
                .par_iter()
                .map(|code| (code.clone(), self.run_one(code)))
                .collect()
        } else {
            languages
                .iter()
                .map(|code| (code.clone(), self.run_one(code)))
                .collect()
        };

        let mut view = RegionalView::default();
        for (code, result) in results {
            match result {
                Ok(run) => {
                    view.runs.insert(code, run);
                }
                Err(GemError::InsufficientVotes(reason)) => {
                    warn!(language = %code, "skipping language: no votes for {reason}");
                    view.skipped.insert(code, reason);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            ranked = view.runs.len(),
            skipped = view.skipped.len(),
            "regional rankings complete"
        );
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TopEntries;
    use crate::types::{Item, QualityMeasure, VoteCounts};

    fn bilingual_catalog() -> Catalog {
        Catalog::from_items(vec![
            // Loved by English speakers, disliked by French speakers
            Item::new("en-fav", "English Favourite", VoteCounts::new(95, 25))
                .with_players(10_000)
                .with_language("en", VoteCounts::new(90, 5))
                .with_language("fr", VoteCounts::new(5, 20)),
            // The reverse
            Item::new("fr-fav", "French Favourite", VoteCounts::new(95, 25))
                .with_players(10_000)
                .with_language("en", VoteCounts::new(5, 20))
                .with_language("fr", VoteCounts::new(90, 5)),
        ])
    }

    fn config(languages: &[&str], parallel: bool) -> Config {
        Config {
            languages: languages.iter().map(|s| s.to_string()).collect(),
            parallel_regions: parallel,
            top: TopEntries::ALL,
            ..Default::default()
        }
    }

    #[test]
    fn test_languages_rank_independently() {
        let catalog = bilingual_catalog();
        let config = config(&["en", "fr"], false);
        let view = RegionalPartitioner::new(&config, &catalog)
            .with_alpha(Some(1e4))
            .partition()
            .unwrap();

        assert_eq!(view.get("en").unwrap().outcome.ranking.ids(), vec!["en-fav", "fr-fav"]);
        assert_eq!(view.get("fr").unwrap().outcome.ranking.ids(), vec!["fr-fav", "en-fav"]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let catalog = bilingual_catalog();
        let refs = Config {
            reference_ids: vec!["fr-fav".into()],
            ..config(&["en", "fr", "de"], true)
        };
        let sequential = Config {
            parallel_regions: false,
            ..refs.clone()
        };

        let a = RegionalPartitioner::new(&refs, &catalog).with_alpha(Some(500.0)).partition().unwrap();
        let b = RegionalPartitioner::new(&sequential, &catalog).with_alpha(Some(500.0)).partition().unwrap();

        assert_eq!(a.languages().collect::<Vec<_>>(), vec!["de", "en", "fr"]);
        for code in ["de", "en", "fr"] {
            assert_eq!(a.get(code).unwrap().outcome.ranking, b.get(code).unwrap().outcome.ranking);
        }
    }

    #[test]
    fn test_language_without_votes_is_skipped_for_bayesian() {
        let catalog = bilingual_catalog();
        let config = Config {
            quality: QualityMeasure::Bayesian,
            prior_scope: crate::types::PriorScope::SubsetPerLanguage,
            ..config(&["en", "ja"], false)
        };
        let view = RegionalPartitioner::new(&config, &catalog)
            .with_alpha(Some(1e4))
            .partition()
            .unwrap();

        assert!(view.get("en").is_some());
        assert!(view.get("ja").is_none());
        assert!(view.skipped.contains_key("ja"));
    }
}
