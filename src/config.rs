//! Configuration loading from gemrank.toml.
//!
//! ## Example
//!
//! ```toml
//! quality = "bayesian"
//! popularity = "players"
//! prior-scope = "subset_pooled"
//! confidence = 0.95
//! optimize = true
//! top = 250              # or "all"
//! reference-ids = ["373390", "418180"]
//! exclude-keywords = ["Visual Novel", "Anime"]
//! output-dir = "regional"
//!
//! [search]
//! upper-bound = 1e8
//! seed = 0
//!
//! [[calibration]]
//! popularity = "players"
//! quality = "bayesian"
//! log10-alpha = 6.47
//! computed-on = "2018-03-22"
//! ```
//!
//! Every key is optional; missing keys fall back to compiled defaults.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::calibration::{CalibrationEntry, CalibrationTable, SearchSettings};
use crate::error::{GemError, Result};
use crate::types::{PopularityMeasure, PriorScope, QualityMeasure};

pub const CONFIG_FILE: &str = "gemrank.toml";

/// Contradiction (2015): the hidden gem the ranking was first tuned on.
pub const DEFAULT_REFERENCE_IDS: &[&str] = &["373390"];

pub const DEFAULT_STORE_URL: &str = "http://store.steampowered.com/app/";

pub const DEFAULT_URL_WIDTH: usize = 40;

pub const DEFAULT_TOP_ENTRIES: usize = 250;

/// Languages with a regional ranking by default.
pub const DEFAULT_LANGUAGES: &[&str] = &[
    "bg", "cs", "da", "de", "el", "en", "es", "fi", "fr", "hu", "it", "ja", "ko", "nl", "no", "pl",
    "pt", "ro", "ru", "sv", "th", "tr", "uk", "zh-cn",
];

/// Number of entries to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TopEntries {
    Count(usize),
    All(AllMarker),
}

/// The literal string `"all"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllMarker {
    All,
}

impl TopEntries {
    pub const ALL: TopEntries = TopEntries::All(AllMarker::All);

    /// `None` means unbounded.
    pub fn limit(&self) -> Option<usize> {
        match self {
            TopEntries::Count(n) => Some(*n),
            TopEntries::All(_) => None,
        }
    }
}

impl Default for TopEntries {
    fn default() -> Self {
        TopEntries::Count(DEFAULT_TOP_ENTRIES)
    }
}

impl fmt::Display for TopEntries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopEntries::Count(n) => write!(f, "{n}"),
            TopEntries::All(_) => f.write_str("all"),
        }
    }
}

impl std::str::FromStr for TopEntries {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(TopEntries::ALL);
        }
        s.parse::<usize>()
            .map(TopEntries::Count)
            .map_err(|_| format!("expected a number or \"all\", got {s:?}"))
    }
}

/// gemrank configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source file for this config (for display).
    pub source: Option<PathBuf>,

    pub quality: QualityMeasure,
    pub popularity: PopularityMeasure,
    pub prior_scope: PriorScope,

    /// Confidence of the Wilson lower bound, in (0, 1).
    pub confidence: f64,

    /// Calibrate alpha at runtime; otherwise use the cached table.
    pub optimize: bool,

    pub top: TopEntries,

    pub include_ids: Vec<String>,
    pub exclude_ids: Vec<String>,
    pub include_keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,

    /// Known hidden gems the calibration targets.
    pub reference_ids: Vec<String>,

    /// Language codes with a regional ranking.
    pub languages: Vec<String>,

    pub store_url: String,
    pub url_width: usize,

    /// Directory of the regional `hidden_gems_{lang}.md` files.
    pub output_dir: PathBuf,

    pub search: SearchSettings,
    pub calibration: CalibrationTable,

    /// Rank languages concurrently.
    pub parallel_regions: bool,

    /// Flush the language detection cache every this many apps.
    pub cache_flush_every: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            quality: QualityMeasure::default(),
            popularity: PopularityMeasure::default(),
            prior_scope: PriorScope::default(),
            confidence: crate::quality::DEFAULT_CONFIDENCE,
            optimize: true,
            top: TopEntries::default(),
            include_ids: Vec::new(),
            exclude_ids: Vec::new(),
            include_keywords: Vec::new(),
            exclude_keywords: Vec::new(),
            reference_ids: DEFAULT_REFERENCE_IDS.iter().map(|s| s.to_string()).collect(),
            languages: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            store_url: DEFAULT_STORE_URL.to_string(),
            url_width: DEFAULT_URL_WIDTH,
            output_dir: PathBuf::from("regional"),
            search: SearchSettings::default(),
            calibration: CalibrationTable::default(),
            parallel_regions: true,
            cache_flush_every: 100,
        }
    }
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    quality: Option<QualityMeasure>,
    popularity: Option<PopularityMeasure>,
    prior_scope: Option<PriorScope>,
    /// Legacy switch: prior fitted on the whole catalog.
    whole_catalog_prior: Option<bool>,
    /// Legacy switch: prior fitted per language.
    language_specific_prior: Option<bool>,
    confidence: Option<f64>,
    optimize: Option<bool>,
    top: Option<TopEntries>,
    include_ids: Option<Vec<String>>,
    exclude_ids: Option<Vec<String>>,
    include_keywords: Option<Vec<String>>,
    exclude_keywords: Option<Vec<String>>,
    reference_ids: Option<Vec<String>>,
    languages: Option<Vec<String>>,
    store_url: Option<String>,
    url_width: Option<usize>,
    output_dir: Option<String>,
    search: Option<SearchSettings>,
    calibration: Option<Vec<CalibrationEntry>>,
    parallel_regions: Option<bool>,
    cache_flush_every: Option<usize>,
}

impl Config {
    /// Load configuration from the given directory.
    ///
    /// Search order:
    /// 1. gemrank.toml in directory
    /// 2. Walk up to find gemrank.toml
    /// 3. Default config if nothing found
    ///
    /// A file that exists but does not parse or validate is an error.
    pub fn load(directory: &Path) -> Result<Self> {
        let mut current = Some(directory);
        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Self::load_file(&candidate);
            }
            current = dir.parent();
        }

        debug!(dir = %directory.display(), "no {CONFIG_FILE} found, using defaults");
        Ok(Self::default())
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GemError::io(path, e))?;
        let raw: RawConfig = toml::from_str(&content).map_err(|e| GemError::Malformed {
            path: path.to_path_buf(),
            what: "configuration",
            message: e.to_string(),
        })?;
        let config = Self::from_raw(raw, Some(path.to_path_buf()))?;
        config.validate()?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| GemError::Malformed {
            path: "<inline>".into(),
            what: "configuration",
            message: e.to_string(),
        })?;
        let config = Self::from_raw(raw, None)?;
        config.validate()?;
        Ok(config)
    }

    fn from_raw(raw: RawConfig, source: Option<PathBuf>) -> Result<Self> {
        let defaults = Self::default();
        let prior_scope = resolve_prior_scope(
            raw.prior_scope,
            raw.whole_catalog_prior.unwrap_or(false),
            raw.language_specific_prior.unwrap_or(false),
        )?;

        let calibration = match raw.calibration {
            Some(entries) => defaults.calibration.merged(entries),
            None => defaults.calibration,
        };

        Ok(Self {
            source,
            quality: raw.quality.unwrap_or(defaults.quality),
            popularity: raw.popularity.unwrap_or(defaults.popularity),
            prior_scope,
            confidence: raw.confidence.unwrap_or(defaults.confidence),
            optimize: raw.optimize.unwrap_or(defaults.optimize),
            top: raw.top.unwrap_or(defaults.top),
            include_ids: raw.include_ids.unwrap_or_default(),
            exclude_ids: raw.exclude_ids.unwrap_or_default(),
            include_keywords: raw.include_keywords.unwrap_or_default(),
            exclude_keywords: raw.exclude_keywords.unwrap_or_default(),
            reference_ids: raw.reference_ids.unwrap_or(defaults.reference_ids),
            languages: raw.languages.unwrap_or(defaults.languages),
            store_url: raw.store_url.unwrap_or(defaults.store_url),
            url_width: raw.url_width.unwrap_or(defaults.url_width),
            output_dir: raw.output_dir.map(PathBuf::from).unwrap_or(defaults.output_dir),
            search: raw.search.unwrap_or(defaults.search),
            calibration,
            parallel_regions: raw.parallel_regions.unwrap_or(defaults.parallel_regions),
            cache_flush_every: raw.cache_flush_every.unwrap_or(defaults.cache_flush_every),
        })
    }

    /// Reject settings no run can satisfy.
    pub fn validate(&self) -> Result<()> {
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(GemError::conflict(format!(
                "confidence must lie in (0, 1), got {}",
                self.confidence
            )));
        }
        if self.optimize && self.reference_ids.is_empty() {
            return Err(GemError::conflict(
                "reference-ids is empty but optimize = true; nothing to calibrate against",
            ));
        }
        if !(self.search.upper_bound > 1.0) {
            return Err(GemError::conflict(format!(
                "search.upper-bound must exceed 1, got {}",
                self.search.upper_bound
            )));
        }
        let (f_lo, f_hi) = self.search.mutation;
        if !(0.0 < f_lo && f_lo <= f_hi && f_hi <= 2.0) {
            return Err(GemError::conflict(format!(
                "search.mutation must satisfy 0 < low <= high <= 2, got ({f_lo}, {f_hi})"
            )));
        }
        if !(self.search.tolerance >= 0.0) {
            return Err(GemError::conflict("search.tolerance must be non-negative"));
        }
        if self.cache_flush_every == 0 {
            return Err(GemError::conflict("cache-flush-every must be at least 1"));
        }
        if !self.optimize {
            // Fail now rather than after the catalog is loaded
            self.calibration.lookup(self.popularity, self.quality)?;
        }
        Ok(())
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();

        if let Some(ref source) = self.source {
            lines.push(format!("   Config: {}", source.display()));
        } else {
            lines.push("   Config: (defaults)".to_string());
        }

        lines.push(format!(
            "   Measures: quality = {}, popularity = {}, prior = {}",
            self.quality, self.popularity, self.prior_scope
        ));

        if self.optimize {
            lines.push(format!(
                "   Alpha: optimized (seed {}, upper bound {:e})",
                self.search.seed, self.search.upper_bound
            ));
        } else {
            lines.push("   Alpha: cached".to_string());
        }

        lines.push(format!("   References: {}", self.reference_ids.join(", ")));

        if !self.include_keywords.is_empty() {
            lines.push(format!("   Include keywords: {}", self.include_keywords.join(", ")));
        }
        if !self.exclude_keywords.is_empty() {
            lines.push(format!("   Exclude keywords: {}", self.exclude_keywords.join(", ")));
        }

        if self.languages.len() <= 3 {
            lines.push(format!("   Languages: {}", self.languages.join(", ")));
        } else {
            lines.push(format!(
                "   Languages: {}, ... (+{} more)",
                self.languages[..2].join(", "),
                self.languages.len() - 2
            ));
        }

        lines.join("\n")
    }
}

/// Merge the explicit scope with the legacy boolean switches.
fn resolve_prior_scope(explicit: Option<PriorScope>, whole_catalog: bool, per_language: bool) -> Result<PriorScope> {
    if whole_catalog && per_language {
        return Err(GemError::conflict(
            "whole-catalog-prior and language-specific-prior are mutually exclusive",
        ));
    }
    let legacy = match (whole_catalog, per_language) {
        (true, _) => Some(PriorScope::WholeCatalog),
        (_, true) => Some(PriorScope::SubsetPerLanguage),
        _ => None,
    };
    match (explicit, legacy) {
        (Some(a), Some(b)) if a != b => Err(GemError::conflict(format!(
            "prior-scope = {a} contradicts the legacy switch selecting {b}"
        ))),
        (Some(scope), _) | (None, Some(scope)) => Ok(scope),
        (None, None) => Ok(PriorScope::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.languages.len(), 24);
        assert_eq!(config.top.limit(), Some(DEFAULT_TOP_ENTRIES));
    }

    #[test]
    fn test_parse_full_file() {
        let config = Config::from_toml_str(
            r#"
            quality = "bayesian"
            popularity = "reviews"
            prior-scope = "whole_catalog"
            top = "all"
            reference-ids = ["1", "2"]
            exclude-keywords = ["Anime"]

            [search]
            seed = 9
            population = 20

            [[calibration]]
            popularity = "reviews"
            quality = "bayesian"
            log10-alpha = 5.0
            computed-on = "2026-01-01"
            "#,
        )
        .unwrap();

        assert_eq!(config.quality, QualityMeasure::Bayesian);
        assert_eq!(config.popularity, PopularityMeasure::Reviews);
        assert_eq!(config.prior_scope, PriorScope::WholeCatalog);
        assert_eq!(config.top, TopEntries::ALL);
        assert_eq!(config.top.limit(), None);
        assert_eq!(config.search.seed, 9);
        assert_eq!(config.search.upper_bound, 1e8);
        let cached = config
            .calibration
            .get(PopularityMeasure::Reviews, QualityMeasure::Bayesian)
            .unwrap();
        assert_eq!(cached.log10_alpha, 5.0);
    }

    #[test]
    fn test_top_entries_parse() {
        assert_eq!("all".parse::<TopEntries>().unwrap(), TopEntries::ALL);
        assert_eq!("25".parse::<TopEntries>().unwrap(), TopEntries::Count(25));
        assert!("many".parse::<TopEntries>().is_err());
    }

    #[test]
    fn test_legacy_prior_switches() {
        let config = Config::from_toml_str("language-specific-prior = true").unwrap();
        assert_eq!(config.prior_scope, PriorScope::SubsetPerLanguage);

        let err = Config::from_toml_str(
            "whole-catalog-prior = true\nlanguage-specific-prior = true",
        )
        .unwrap_err();
        assert!(matches!(err, GemError::ConfigurationConflict(_)));

        let err = Config::from_toml_str(
            "prior-scope = \"subset_pooled\"\nwhole-catalog-prior = true",
        )
        .unwrap_err();
        assert!(matches!(err, GemError::ConfigurationConflict(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_confidence = Config {
            confidence: 1.0,
            ..Default::default()
        };
        assert!(bad_confidence.validate().is_err());

        let no_refs = Config {
            reference_ids: vec![],
            ..Default::default()
        };
        assert!(no_refs.validate().is_err());

        let no_cache = Config {
            optimize: false,
            calibration: CalibrationTable::new(vec![]),
            ..Default::default()
        };
        assert!(matches!(no_cache.validate(), Err(GemError::ConfigurationConflict(_))));
    }

    #[test]
    fn test_unknown_key_is_malformed() {
        let err = Config::from_toml_str("qualty = \"bayesian\"").unwrap_err();
        assert!(matches!(err, GemError::Malformed { what: "configuration", .. }));
    }

    #[test]
    fn test_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "top = 10\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = Config::load(&nested).unwrap();
        assert_eq!(config.top, TopEntries::Count(10));
        assert_eq!(config.source, Some(dir.path().join(CONFIG_FILE)));
    }
}
