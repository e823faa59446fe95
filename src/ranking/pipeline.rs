//! One complete ranking run for one vote scope.
//!
//! ```text
//! catalog ─► prior (Bayesian only) ─► estimator ─► signals
//!                                                    │
//!            alpha (calibrated or cached) ◄──────────┤
//!                                                    ▼
//!            keyword/id filters ─────────────► RankingEngine ─► RunOutcome
//! ```
//!
//! The overall ranking uses [`VoteScope::Overall`]; the regional partitioner
//! runs the same pipeline once per [`VoteScope::Language`].

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use super::engine::{RankOutcome, RankRequest, RankingEngine};
use super::score::SignalBuilder;
use crate::calibration::{AlphaSource, Calibration, Calibrator};
use crate::catalog::{Catalog, KeywordFilter, ReferenceSet};
use crate::config::Config;
use crate::error::{GemError, Result};
use crate::quality::{MedianPrior, Prior, PriorFitter, PriorSelector, QualityEstimator};
use crate::types::{ItemSignal, QualityMeasure, SignalFlag, VoteScope};

static MEDIAN_PRIOR: MedianPrior = MedianPrior;

/// Result of one run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub scope: VoteScope,
    pub calibration: Calibration,
    pub prior: Option<Prior>,
    pub outcome: RankOutcome,
    pub stats: RunStats,
}

/// Counts reported after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub items: usize,
    pub no_votes: usize,
    pub inconsistent: usize,
    pub references_present: usize,
}

/// Orchestrates signals, calibration and ranking over a catalog.
pub struct RankingRun<'a> {
    config: &'a Config,
    catalog: &'a Catalog,
    whole_catalog: &'a Catalog,
    references: ReferenceSet,
    fitter: &'a dyn PriorFitter,
    fixed_alpha: Option<f64>,
}

impl<'a> RankingRun<'a> {
    pub fn new(config: &'a Config, catalog: &'a Catalog) -> Self {
        Self {
            config,
            catalog,
            whole_catalog: catalog,
            references: ReferenceSet::new(config.reference_ids.iter().cloned()),
            fitter: &MEDIAN_PRIOR,
            fixed_alpha: None,
        }
    }

    /// Full product catalog for the `whole_catalog` prior scope.
    pub fn with_whole_catalog(mut self, whole_catalog: &'a Catalog) -> Self {
        self.whole_catalog = whole_catalog;
        self
    }

    pub fn with_fitter(mut self, fitter: &'a dyn PriorFitter) -> Self {
        self.fitter = fitter;
        self
    }

    /// Skip calibration and use this alpha.
    pub fn with_alpha(mut self, alpha: Option<f64>) -> Self {
        self.fixed_alpha = alpha;
        self
    }

    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    /// Prior for the configured scope, only when the Bayesian measure needs one.
    pub fn prior(&self, scope: &VoteScope) -> Result<Option<Prior>> {
        if self.config.quality != QualityMeasure::Bayesian {
            return Ok(None);
        }
        let selector = PriorSelector::new(self.config.prior_scope, self.fitter);
        selector
            .select(self.catalog, self.whole_catalog, scope)
            .map(Some)
    }

    pub fn signals(&self, scope: &VoteScope, prior: Option<Prior>) -> Result<Vec<ItemSignal>> {
        let estimator = QualityEstimator::for_measure(self.config.quality, self.config.confidence, prior)
            .ok_or_else(|| GemError::conflict(format!("quality = {} requires a prior", self.config.quality)))?;
        Ok(SignalBuilder::new(estimator, self.config.popularity).build(self.catalog, scope))
    }

    /// Alpha from the calibrator, the cached table or the fixed override.
    pub fn resolve_alpha(&self, engine: &RankingEngine<'_>) -> Result<Calibration> {
        if let Some(alpha) = self.fixed_alpha {
            if alpha.is_nan() || alpha <= 0.0 {
                return Err(GemError::conflict(format!("alpha must be positive, got {alpha}")));
            }
            return Ok(Calibration {
                alpha,
                objective: None,
                evaluations: 0,
                source: AlphaSource::Fixed,
            });
        }
        if self.config.optimize {
            Calibrator::new(self.config.search).calibrate(engine)
        } else {
            let cached = self.config.calibration.lookup(self.config.popularity, self.config.quality)?;
            debug!(alpha = cached.alpha, source = ?cached.source, "using cached alpha");
            Ok(cached)
        }
    }

    /// Include/exclude id sets from configured ids and keywords.
    ///
    /// Include ids and include keywords intersect; exclude ids and exclude
    /// keywords are pooled.
    pub fn filters(&self) -> (Option<BTreeSet<String>>, BTreeSet<String>) {
        let keywords = KeywordFilter::resolve(
            self.catalog,
            &self.config.include_keywords,
            &self.config.exclude_keywords,
        );

        let explicit: Option<BTreeSet<String>> = (!self.config.include_ids.is_empty())
            .then(|| self.config.include_ids.iter().cloned().collect());

        let include = match (explicit, keywords.include) {
            (Some(ids), Some(tagged)) => Some(ids.intersection(&tagged).cloned().collect()),
            (Some(ids), None) => Some(ids),
            (None, tagged) => tagged,
        };

        let mut exclude = keywords.exclude;
        exclude.extend(self.config.exclude_ids.iter().cloned());
        (include, exclude)
    }

    pub fn run(&self, scope: &VoteScope) -> Result<RunOutcome> {
        let prior = self.prior(scope)?;
        let signals = self.signals(scope, prior)?;
        let engine = RankingEngine::new(&signals, &self.references);
        let calibration = self.resolve_alpha(&engine)?;

        let (include, exclude) = self.filters();
        let request = RankRequest::new(calibration.alpha)
            .top(self.config.top.limit())
            .include(include)
            .exclude(exclude);
        let outcome = engine.rank(&request);

        let stats = RunStats {
            items: signals.len(),
            no_votes: signals.iter().filter(|s| s.flag == SignalFlag::NoVotes).count(),
            inconsistent: signals
                .iter()
                .filter(|s| s.flag == SignalFlag::InconsistentEstimate)
                .count(),
            references_present: engine.references_present(),
        };

        info!(
            scope = scope.label(),
            items = stats.items,
            shown = outcome.ranking.len(),
            "ranking complete"
        );

        Ok(RunOutcome {
            scope: scope.clone(),
            calibration,
            prior,
            outcome,
            stats,
        })
    }
}
