//! Prior-smoothed proportion of positive votes.
//!
//! ```text
//! score = (prior.weight · prior.mean + n · p) / (prior.weight + n)
//! ```
//!
//! Small samples are pulled towards the population mean; large samples are
//! dominated by their own ratio.

use super::prior::{Observation, Prior};

/// Bayesian rating of one observation, `None` when it carries no votes.
pub fn bayesian_score(observation: &Observation, prior: &Prior) -> Option<f64> {
    if observation.num_votes == 0 {
        return None;
    }
    let n = observation.num_votes as f64;
    let weight = prior.weight.max(0.0);
    Some((weight * prior.mean + n * observation.score) / (weight + n))
}
