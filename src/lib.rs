//! gemrank - hidden gems of a game catalog
//!
//! Ranks products by review quality relative to popularity: a game loved by
//! few players beats a game loved by millions. One scalar per item:
//!
//! ```text
//! score = quality × alpha / (alpha + popularity)
//! ```
//!
//! # Architecture
//!
//! ```text
//! Catalog → Quality Estimator → Score Function → Calibrator → Ranking Engine → Rendering
//!    ↓            ↓                   ↓              ↓              ↓              ↓
//!  serde     Wilson bound /      decay in       differential    total order,   markdown,
//!  JSON      Bayesian + prior    popularity      evolution      compaction     id list
//! ```
//!
//! The regional variant runs the same pipeline once per language, on that
//! language's vote sub-counts, in parallel via rayon.
//!
//! # Determinism
//!
//! - The catalog is a `BTreeMap`; iteration is in id order
//! - Ties in score are broken by id ascending
//! - The calibrator is seeded
//! - Regional results are collected into an ordered map

pub mod cache;
pub mod calibration;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod quality;
pub mod ranking;
pub mod regional;
pub mod rendering;
pub mod types;

// Re-export core types
pub use catalog::{Catalog, KeywordFilter, ReferenceSet};
pub use config::{Config, TopEntries};
pub use error::{GemError, Result};
pub use types::{
    Item, ItemSignal, PopularityMeasure, PriorScope, QualityMeasure, RankEntry, Ranking, VoteCounts,
    VoteScope, NO_VOTES_SENTINEL,
};

// Re-export pipeline entry points
pub use calibration::{Calibration, CalibrationTable, Calibrator, SearchSettings};
pub use ranking::{RankRequest, RankingEngine, RankingRun, RunOutcome};
pub use regional::{RegionalPartitioner, RegionalView};
