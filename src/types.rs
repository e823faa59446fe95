//! Core types for gemrank.
//!
//! Items are immutable for the duration of a ranking run. Everything the
//! ranking engine needs is distilled into an [`ItemSignal`] (one quality value
//! and one popularity value per item and scope), so the engine never looks at
//! raw vote counts again.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Quality value of an item with no votes in the current scope.
///
/// Every estimator maps "no votes" to this value. It is below every real
/// quality value (which live in `[0, 1]`), so such items sort last.
pub const NO_VOTES_SENTINEL: f64 = -1.0;

/// Positive/negative vote counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    #[serde(default)]
    pub positive: u64,
    #[serde(default)]
    pub negative: u64,
}

impl VoteCounts {
    pub fn new(positive: u64, negative: u64) -> Self {
        Self { positive, negative }
    }

    pub fn total(&self) -> u64 {
        self.positive + self.negative
    }

    /// Fraction of positive votes, `None` without votes.
    pub fn fraction(&self) -> Option<f64> {
        let n = self.total();
        (n > 0).then(|| self.positive as f64 / n as f64)
    }
}

impl std::ops::Add for VoteCounts {
    type Output = VoteCounts;

    fn add(self, rhs: VoteCounts) -> VoteCounts {
        VoteCounts::new(self.positive + rhs.positive, self.negative + rhs.negative)
    }
}

/// One catalog entry (a Steam app).
///
/// The id is the catalog key; it is filled in by the catalog loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(skip_deserializing, skip_serializing)]
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub votes: VoteCounts,
    #[serde(default)]
    pub owners: u64,
    #[serde(default)]
    pub players: u64,
    #[serde(default)]
    pub median_playtime: f64,
    #[serde(default)]
    pub average_playtime: f64,
    /// False when store-tag filtering hides the item. It still holds a rank slot.
    #[serde(rename = "show", default = "default_true")]
    pub include_in_output: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Per-language vote sub-counts, keyed by normalized language code.
    #[serde(default)]
    pub languages: BTreeMap<String, VoteCounts>,
}

fn default_true() -> bool {
    true
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>, votes: VoteCounts) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            votes,
            include_in_output: true,
            ..Default::default()
        }
    }

    pub fn with_players(mut self, players: u64) -> Self {
        self.players = players;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.include_in_output = false;
        self
    }

    pub fn with_language(mut self, code: &str, votes: VoteCounts) -> Self {
        self.languages.insert(code.to_string(), votes);
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Review count across all languages of the breakdown.
    pub fn breakdown_total(&self) -> u64 {
        self.languages.values().map(VoteCounts::total).sum()
    }

    pub fn has_tag(&self, keyword: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(keyword))
    }
}

/// Which vote counts a signal is computed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VoteScope {
    /// Overall votes, all languages.
    Overall,
    /// Only the sub-counts of one language (normalized code).
    Language(String),
}

impl VoteScope {
    pub fn label(&self) -> &str {
        match self {
            VoteScope::Overall => "overall",
            VoteScope::Language(code) => code,
        }
    }
}

/// Quality measure selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMeasure {
    /// Wilson lower confidence bound.
    #[default]
    #[serde(alias = "wilson_score", alias = "wilson")]
    LowerConfidenceBound,
    /// Prior-smoothed proportion.
    #[serde(alias = "bayesian_rating")]
    Bayesian,
}

/// Popularity measure selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopularityMeasure {
    #[default]
    #[serde(alias = "num_players")]
    Players,
    #[serde(alias = "num_reviews")]
    Reviews,
}

/// Population the Bayesian prior is fitted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorScope {
    /// Every item of the full product catalog with at least one vote.
    WholeCatalog,
    /// Every item of the working set, all languages pooled.
    #[default]
    SubsetPooled,
    /// Working set, one language's sub-counts at a time.
    SubsetPerLanguage,
}

macro_rules! str_enum {
    ($ty:ty { $($variant:path => $name:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
                    $($name $(| $alias)* => Ok($variant),)+
                    other => Err(format!("unrecognized {}: {}", stringify!($ty), other)),
                }
            }
        }
    };
}

str_enum!(QualityMeasure {
    QualityMeasure::LowerConfidenceBound => "lower_confidence_bound" | "wilson_score" | "wilson",
    QualityMeasure::Bayesian => "bayesian" | "bayesian_rating",
});

str_enum!(PopularityMeasure {
    PopularityMeasure::Players => "players" | "num_players",
    PopularityMeasure::Reviews => "reviews" | "num_reviews",
});

str_enum!(PriorScope {
    PriorScope::WholeCatalog => "whole_catalog",
    PriorScope::SubsetPooled => "subset_pooled",
    PriorScope::SubsetPerLanguage => "subset_per_language",
});

/// How an item's signal was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalFlag {
    Scored,
    /// No votes in scope; quality is the sentinel.
    NoVotes,
    /// Regional players estimate below regional reviews; both values are sentinels.
    InconsistentEstimate,
}

/// Quality and popularity of one item in one scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSignal {
    pub id: String,
    pub name: String,
    pub quality: f64,
    pub popularity: f64,
    pub include_in_output: bool,
    pub flag: SignalFlag,
}

impl ItemSignal {
    pub fn new(id: impl Into<String>, quality: f64, popularity: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            quality,
            popularity,
            include_in_output: true,
            flag: SignalFlag::Scored,
        }
    }
}

/// An item signal with its score under one alpha.
#[derive(Debug, Clone, Copy)]
pub struct ScoredItem<'a> {
    pub score: f64,
    pub signal: &'a ItemSignal,
}

impl<'a> ScoredItem<'a> {
    pub fn new(score: f64, signal: &'a ItemSignal) -> Self {
        Self { score, signal }
    }
}

/// Ordering by score (descending - highest score first), then id ascending.
impl PartialEq for ScoredItem<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for ScoredItem<'_> {}

impl PartialOrd for ScoredItem<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredItem<'_> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.signal.id.cmp(&other.signal.id))
    }
}

/// One visible line of a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    /// 1-indexed, contiguous across visible entries.
    pub rank: usize,
    pub name: String,
    pub id: String,
}

/// Rendered ranking: visible entries only, in rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    pub entries: Vec<RankEntry>,
}

impl Ranking {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }
}
