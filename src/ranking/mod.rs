//! Ranking pipeline - from vote counts to a published list of hidden gems.
//!
//! ```text
//! Catalog → SignalBuilder → score(alpha) → sort → compaction/filters → Ranking
//!              ↑                  ↑
//!        quality estimator    Calibrator (or cached alpha)
//! ```
//!
//! - `score`: the decay-weighted score function and per-item signals
//! - `engine`: total order, rank compaction, filters, objective value
//! - `pipeline`: one complete ranking run for one scope (overall or a language)

mod engine;
mod pipeline;
mod score;

pub use engine::{RankOutcome, RankRequest, RankingEngine};
pub use pipeline::{RankingRun, RunOutcome, RunStats};
pub use score::{decay, max_popularity, score, SignalBuilder};
