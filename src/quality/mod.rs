//! Quality estimators: vote counts to one scalar per item.
//!
//! Two interchangeable estimators, selected by [`QualityMeasure`]:
//!
//! | Measure                | Needs a prior | Zero votes |
//! |------------------------|---------------|------------|
//! | `LowerConfidenceBound` | no            | sentinel   |
//! | `Bayesian`             | yes           | sentinel   |
//!
//! Both return `None` for zero votes; [`QualityEstimator::quality`] maps that to
//! [`NO_VOTES_SENTINEL`] so callers never see a division by zero.

mod bayesian;
mod prior;
mod wilson;

pub use bayesian::bayesian_score;
pub use prior::{MedianPrior, Observation, Prior, PriorFitter, PriorSelector};
pub use wilson::{inverse_normal_cdf, wilson_score, z_for_confidence};

use crate::types::{QualityMeasure, VoteCounts, NO_VOTES_SENTINEL};

/// Default confidence for the Wilson lower bound.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// A configured quality estimator.
#[derive(Debug, Clone, Copy)]
pub enum QualityEstimator {
    LowerConfidenceBound { confidence: f64 },
    Bayesian { prior: Prior },
}

impl QualityEstimator {
    /// Build the estimator for a measure. The Bayesian one requires a prior.
    pub fn for_measure(measure: QualityMeasure, confidence: f64, prior: Option<Prior>) -> Option<Self> {
        match measure {
            QualityMeasure::LowerConfidenceBound => Some(Self::LowerConfidenceBound { confidence }),
            QualityMeasure::Bayesian => prior.map(|prior| Self::Bayesian { prior }),
        }
    }

    /// Raw estimate, `None` when there are no votes.
    pub fn estimate(&self, votes: VoteCounts) -> Option<f64> {
        match self {
            Self::LowerConfidenceBound { confidence } => {
                wilson_score(votes.positive, votes.negative, *confidence)
            }
            Self::Bayesian { prior } => {
                Observation::from_votes(votes).and_then(|obs| bayesian_score(&obs, prior))
            }
        }
    }

    /// Estimate with the sentinel substituted for "no votes".
    pub fn quality(&self, votes: VoteCounts) -> f64 {
        self.estimate(votes).unwrap_or(NO_VOTES_SENTINEL)
    }
}
