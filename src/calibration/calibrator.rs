//! Alpha calibration against the reference set.

use serde::Serialize;
use tracing::{debug, info};

use super::evolution::{minimize_scalar, ParamRange, SearchSettings};
use crate::error::{GemError, Result};
use crate::ranking::{max_popularity, RankingEngine};
use crate::types::ItemSignal;

/// Where an alpha value came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlphaSource {
    Optimized { generations: usize, converged: bool },
    Cached { computed_on: String },
    Fixed,
}

/// A calibrated alpha and the objective it achieves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calibration {
    pub alpha: f64,
    /// Mean provisional reference rank at `alpha`; `None` for cached values.
    pub objective: Option<f64>,
    pub evaluations: usize,
    pub source: AlphaSource,
}

impl Calibration {
    pub fn log10_alpha(&self) -> f64 {
        self.alpha.log10()
    }
}

/// Minimises the mean reference rank over alpha.
#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    settings: SearchSettings,
}

impl Calibrator {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Search interval `[1 + max popularity, upper_bound]`, in log space.
    pub fn search_bounds(&self, signals: &[ItemSignal]) -> Result<ParamRange> {
        let lower = 1.0 + max_popularity(signals);
        let upper = self.settings.upper_bound;
        if lower >= upper || upper.is_nan() {
            return Err(GemError::conflict(format!(
                "search.upper-bound ({upper:e}) must exceed 1 + max popularity ({lower:e})"
            )));
        }
        Ok(ParamRange::log(lower, upper))
    }

    pub fn calibrate(&self, engine: &RankingEngine<'_>) -> Result<Calibration> {
        if engine.references_present() == 0 {
            return Err(GemError::conflict(
                "no reference-ids are present in the catalog; cannot calibrate alpha",
            ));
        }
        let range = self.search_bounds(engine.signals())?;
        debug!(lower = range.min, upper = range.max, "searching alpha");

        // Absent objective cannot happen once a reference is present
        let result = minimize_scalar(&range, &self.settings, |alpha| {
            engine.objective(alpha).unwrap_or(f64::INFINITY)
        });

        let calibration = Calibration {
            alpha: result.x,
            objective: Some(result.fun),
            evaluations: result.evaluations,
            source: AlphaSource::Optimized {
                generations: result.generations,
                converged: result.converged,
            },
        };

        info!(
            "alpha = 10^{:.2} (objective {:.2}, {} evaluations)",
            calibration.log10_alpha(),
            result.fun,
            calibration.evaluations
        );
        Ok(calibration)
    }
}
