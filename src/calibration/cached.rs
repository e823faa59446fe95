//! Cached alpha values, used when runtime optimisation is disabled.
//!
//! Each entry records the date it was computed on so stale values are easy to
//! spot in `gemrank.toml`:
//!
//! ```toml
//! [[calibration]]
//! popularity = "players"
//! quality = "lower_confidence_bound"
//! log10-alpha = 6.40
//! computed-on = "2017-12-18"
//! ```

use serde::{Deserialize, Serialize};

use super::calibrator::{AlphaSource, Calibration};
use crate::error::{GemError, Result};
use crate::types::{PopularityMeasure, QualityMeasure};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CalibrationEntry {
    pub popularity: PopularityMeasure,
    pub quality: QualityMeasure,
    pub log10_alpha: f64,
    pub computed_on: String,
}

impl CalibrationEntry {
    pub fn new(popularity: PopularityMeasure, quality: QualityMeasure, log10_alpha: f64, computed_on: &str) -> Self {
        Self {
            popularity,
            quality,
            log10_alpha,
            computed_on: computed_on.to_string(),
        }
    }

    pub fn alpha(&self) -> f64 {
        10f64.powf(self.log10_alpha)
    }
}

/// Table of cached alphas keyed by (popularity, quality).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationTable {
    entries: Vec<CalibrationEntry>,
}

impl Default for CalibrationTable {
    fn default() -> Self {
        use PopularityMeasure::*;
        use QualityMeasure::*;
        Self {
            entries: vec![
                CalibrationEntry::new(Players, LowerConfidenceBound, 6.40, "2017-12-18"),
                CalibrationEntry::new(Players, Bayesian, 6.47, "2018-03-22"),
                CalibrationEntry::new(Reviews, LowerConfidenceBound, 4.65, "2018-02-22"),
                CalibrationEntry::new(Reviews, Bayesian, 4.75, "2018-03-22"),
            ],
        }
    }
}

impl CalibrationTable {
    pub fn new(entries: Vec<CalibrationEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CalibrationEntry] {
        &self.entries
    }

    /// Entries from `overrides` replace defaults with the same key.
    pub fn merged(mut self, overrides: Vec<CalibrationEntry>) -> Self {
        for entry in overrides {
            match self
                .entries
                .iter_mut()
                .find(|e| e.popularity == entry.popularity && e.quality == entry.quality)
            {
                Some(slot) => *slot = entry,
                None => self.entries.push(entry),
            }
        }
        self
    }

    pub fn get(&self, popularity: PopularityMeasure, quality: QualityMeasure) -> Option<&CalibrationEntry> {
        self.entries
            .iter()
            .find(|e| e.popularity == popularity && e.quality == quality)
    }

    /// Cached alpha for a measure pair, as a [`Calibration`] with no objective.
    pub fn lookup(&self, popularity: PopularityMeasure, quality: QualityMeasure) -> Result<Calibration> {
        let entry = self.get(popularity, quality).ok_or_else(|| {
            GemError::conflict(format!(
                "no cached alpha for popularity = {popularity}, quality = {quality}; \
                 add a [[calibration]] entry or enable optimization"
            ))
        })?;

        Ok(Calibration {
            alpha: entry.alpha(),
            objective: None,
            evaluations: 0,
            source: AlphaSource::Cached {
                computed_on: entry.computed_on.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = CalibrationTable::default();
        let c = table
            .lookup(PopularityMeasure::Reviews, QualityMeasure::Bayesian)
            .unwrap();
        assert!((c.alpha - 10f64.powf(4.75)).abs() < 1e-6);
        assert_eq!(
            c.source,
            AlphaSource::Cached {
                computed_on: "2018-03-22".into()
            }
        );
        assert!((table.get(PopularityMeasure::Players, QualityMeasure::LowerConfidenceBound).unwrap().log10_alpha - 6.40).abs() < 1e-12);
    }

    #[test]
    fn test_missing_entry_is_conflict() {
        let table = CalibrationTable::new(vec![]);
        let err = table
            .lookup(PopularityMeasure::Players, QualityMeasure::Bayesian)
            .unwrap_err();
        assert!(matches!(err, GemError::ConfigurationConflict(_)));
    }

    #[test]
    fn test_overrides_replace_by_key() {
        let table = CalibrationTable::default().merged(vec![CalibrationEntry::new(
            PopularityMeasure::Players,
            QualityMeasure::Bayesian,
            5.0,
            "2026-01-01",
        )]);
        assert_eq!(table.entries().len(), 4);
        let c = table.lookup(PopularityMeasure::Players, QualityMeasure::Bayesian).unwrap();
        assert!((c.alpha - 1e5).abs() < 1e-6);
    }

    #[test]
    fn test_parse_toml_entries() {
        #[derive(Deserialize)]
        struct Doc {
            calibration: Vec<CalibrationEntry>,
        }
        let doc: Doc = toml::from_str(
            r#"
            [[calibration]]
            popularity = "reviews"
            quality = "lower_confidence_bound"
            log10-alpha = 4.5
            computed-on = "2020-05-01"
            "#,
        )
        .unwrap();
        assert_eq!(doc.calibration[0].popularity, PopularityMeasure::Reviews);
        assert_eq!(doc.calibration[0].log10_alpha, 4.5);
    }
}
