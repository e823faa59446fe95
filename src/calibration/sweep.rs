//! Objective sweep over alpha.
//!
//! The objective is a step function of alpha: it only changes when two items
//! swap places. Evaluating it on a log-spaced grid shows the plateaus and
//! reveals whether the optimum sits on a search bound, in which case the bound
//! should be widened rather than trusted.

use serde::{Deserialize, Serialize};

use super::evolution::ParamRange;
use crate::ranking::RankingEngine;

/// One grid point of the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub alpha: f64,
    pub objective: f64,
}

/// Objective on `n_points` log-spaced alphas across `range` (bounds included).
///
/// Returns an empty curve when no reference item is present.
pub fn objective_curve(engine: &RankingEngine<'_>, range: &ParamRange, n_points: usize) -> Vec<CurvePoint> {
    let n = n_points.max(2);
    let log_range = ParamRange::log(range.min, range.max);

    (0..n)
        .filter_map(|i| {
            let alpha = log_range.decode(i as f64 / (n - 1) as f64);
            engine.objective(alpha).map(|objective| CurvePoint { alpha, objective })
        })
        .collect()
}

/// Best point of a curve (smallest objective, smallest alpha on ties).
pub fn best_point(curve: &[CurvePoint]) -> Option<CurvePoint> {
    curve
        .iter()
        .copied()
        .min_by(|a, b| a.objective.total_cmp(&b.objective).then(a.alpha.total_cmp(&b.alpha)))
}

/// True when the best objective is only reached at the first or last grid point.
pub fn pinned_to_bound(curve: &[CurvePoint]) -> bool {
    let Some(best) = best_point(curve) else {
        return false;
    };
    let interior = curve.len().saturating_sub(2);
    let reached_inside = curve
        .iter()
        .skip(1)
        .take(interior)
        .any(|p| p.objective <= best.objective);
    !reached_inside
}
