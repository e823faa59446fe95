//! Prior selection for the Bayesian estimator.
//!
//! The selector decides *which* observations the prior is fitted on; the
//! [`PriorFitter`] decides *how*. Three scopes:
//!
//! - **whole catalog**: every item of the full product catalog with a vote,
//!   independent of the working set being ranked
//! - **subset pooled**: every item of the working set, all languages pooled
//! - **subset per language**: the working set, one language's sub-counts only
//!
//! Whole-catalog and per-language are mutually exclusive; the configuration
//! layer rejects asking for both.

use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{GemError, Result};
use crate::types::{Item, PriorScope, VoteCounts, VoteScope};

/// (num_votes, score_fraction) pair. Only exists while fitting a prior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub num_votes: u64,
    pub score: f64,
}

impl Observation {
    pub fn from_votes(votes: VoteCounts) -> Option<Self> {
        votes.fraction().map(|score| Self {
            num_votes: votes.total(),
            score,
        })
    }
}

/// Fitted prior: a pseudo-count and the proportion it pulls towards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prior {
    pub weight: f64,
    pub mean: f64,
}

impl Prior {
    pub fn new(weight: f64, mean: f64) -> Self {
        Self { weight, mean }
    }
}

/// Fits a prior from a population of observations.
pub trait PriorFitter: Send + Sync {
    fn fit(&self, observations: &[Observation]) -> Result<Prior>;
}

/// Median vote count as the pseudo-count, mean score fraction as the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct MedianPrior;

impl PriorFitter for MedianPrior {
    fn fit(&self, observations: &[Observation]) -> Result<Prior> {
        if observations.is_empty() {
            return Err(GemError::InsufficientVotes("prior population".into()));
        }

        let mut votes: Vec<u64> = observations.iter().map(|o| o.num_votes).collect();
        votes.sort_unstable();
        let mid = votes.len() / 2;
        let median = if votes.len() % 2 == 0 {
            (votes[mid - 1] + votes[mid]) as f64 / 2.0
        } else {
            votes[mid] as f64
        };

        let mean = observations.iter().map(|o| o.score).sum::<f64>() / observations.len() as f64;

        Ok(Prior::new(median, mean))
    }
}

/// Chooses the observation population for a scope and fits the prior.
pub struct PriorSelector<'a> {
    scope: PriorScope,
    fitter: &'a dyn PriorFitter,
}

impl<'a> PriorSelector<'a> {
    pub fn new(scope: PriorScope, fitter: &'a dyn PriorFitter) -> Self {
        Self { scope, fitter }
    }

    pub fn scope(&self) -> PriorScope {
        self.scope
    }

    /// Observations for this scope.
    ///
    /// `whole_catalog` is the full product catalog; `working_set` is the pool
    /// being ranked. `vote_scope` selects overall or one language's votes.
    pub fn observations(
        &self,
        working_set: &Catalog,
        whole_catalog: &Catalog,
        vote_scope: &VoteScope,
    ) -> Result<Vec<Observation>> {
        let votes_of: Box<dyn Fn(&Item) -> VoteCounts> = match (self.scope, vote_scope) {
            (PriorScope::WholeCatalog, _) => {
                return Ok(collect(whole_catalog, |item| item.votes));
            }
            (PriorScope::SubsetPooled, VoteScope::Overall) => Box::new(|item: &Item| item.votes),
            (PriorScope::SubsetPooled, VoteScope::Language(_)) => Box::new(pooled_votes),
            (PriorScope::SubsetPerLanguage, VoteScope::Language(code)) => {
                let code = code.clone();
                Box::new(move |item: &Item| item.languages.get(&code).copied().unwrap_or_default())
            }
            (PriorScope::SubsetPerLanguage, VoteScope::Overall) => {
                return Err(GemError::conflict(
                    "prior-scope subset_per_language needs a language scope; use subset_pooled for overall rankings",
                ));
            }
        };
        Ok(collect(working_set, votes_of))
    }

    /// Fit the prior for one scope.
    pub fn select(&self, working_set: &Catalog, whole_catalog: &Catalog, vote_scope: &VoteScope) -> Result<Prior> {
        let observations = self.observations(working_set, whole_catalog, vote_scope)?;
        let prior = self.fitter.fit(&observations).map_err(|e| match e {
            GemError::InsufficientVotes(_) => GemError::InsufficientVotes(format!(
                "{} prior ({})",
                self.scope,
                vote_scope.label()
            )),
            other => other,
        })?;
        debug!(
            scope = %self.scope,
            votes = vote_scope.label(),
            observations = observations.len(),
            weight = prior.weight,
            mean = prior.mean,
            "fitted prior"
        );
        Ok(prior)
    }
}

/// Sum of every language sub-count, or overall votes without a breakdown.
fn pooled_votes(item: &Item) -> VoteCounts {
    if item.languages.is_empty() {
        item.votes
    } else {
        item.languages.values().fold(VoteCounts::default(), |acc, v| acc + *v)
    }
}

fn collect(catalog: &Catalog, votes_of: impl Fn(&Item) -> VoteCounts) -> Vec<Observation> {
    catalog.iter().filter_map(|item| Observation::from_votes(votes_of(item))).collect()
}
