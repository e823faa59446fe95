//! Ranking engine: total order, rank compaction, filters and objective value.
//!
//! ## Order
//!
//! Items are sorted by score descending; ties are broken by id ascending, so
//! the order never depends on catalog iteration order.
//!
//! ## Provisional vs display ranks
//!
//! Every item holds a provisional rank (its 1-indexed position in the full
//! order). Reference ranks and the calibration objective are computed from
//! provisional ranks. Display ranks only count visible items:
//!
//! ```text
//! provisional:  1  2  3  4  5
//! visible:      ✓  ✗  ✓  ✓  ✗
//! display:      1     2  3
//! ```
//!
//! An item is hidden when `include_in_output` is false, when an include filter
//! is set and does not list it, or when the exclude filter lists it. All three
//! cases compact the same way: display ranks stay `1..=len`.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::score::score;
use crate::catalog::ReferenceSet;
use crate::types::{ItemSignal, RankEntry, Ranking, ScoredItem};

/// Parameters of one ranking pass.
#[derive(Debug, Clone, Default)]
pub struct RankRequest {
    pub alpha: f64,
    /// Maximum visible entries; `None` renders everything.
    pub num_top_entries: Option<usize>,
    /// When set, only these ids may appear.
    pub include: Option<BTreeSet<String>>,
    /// These ids never appear.
    pub exclude: BTreeSet<String>,
}

impl RankRequest {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            ..Default::default()
        }
    }

    pub fn top(mut self, n: Option<usize>) -> Self {
        self.num_top_entries = n;
        self
    }

    pub fn include(mut self, ids: Option<BTreeSet<String>>) -> Self {
        self.include = ids;
        self
    }

    pub fn exclude(mut self, ids: BTreeSet<String>) -> Self {
        self.exclude = ids;
        self
    }

    fn is_visible(&self, signal: &ItemSignal) -> bool {
        signal.include_in_output
            && self.include.as_ref().map_or(true, |ids| ids.contains(&signal.id))
            && !self.exclude.contains(&signal.id)
    }
}

/// Result of one ranking pass.
#[derive(Debug, Clone, Default)]
pub struct RankOutcome {
    pub ranking: Ranking,
    /// Mean provisional rank of the reference items; `None` when no reference
    /// item is in the catalog (including the empty catalog).
    pub objective: Option<f64>,
    /// Provisional rank of every reference item present in the catalog.
    pub reference_ranks: BTreeMap<String, usize>,
}

/// Ranks a fixed set of signals against a reference set.
pub struct RankingEngine<'a> {
    signals: &'a [ItemSignal],
    references: &'a ReferenceSet,
}

impl<'a> RankingEngine<'a> {
    pub fn new(signals: &'a [ItemSignal], references: &'a ReferenceSet) -> Self {
        Self { signals, references }
    }

    pub fn signals(&self) -> &'a [ItemSignal] {
        self.signals
    }

    /// Number of reference items present in the signals.
    pub fn references_present(&self) -> usize {
        self.signals
            .iter()
            .filter(|s| self.references.contains(&s.id))
            .count()
    }

    fn scored(&self, alpha: f64) -> Vec<ScoredItem<'a>> {
        self.signals
            .iter()
            .map(|s| ScoredItem::new(score(s.quality, s.popularity, alpha), s))
            .collect()
    }

    /// Full order for one alpha, best first.
    pub fn sorted(&self, alpha: f64) -> Vec<ScoredItem<'a>> {
        let mut scored = self.scored(alpha);
        scored.sort();
        scored
    }

    /// Rank, compact, filter and truncate.
    pub fn rank(&self, request: &RankRequest) -> RankOutcome {
        let sorted = self.sorted(request.alpha);
        let limit = request.num_top_entries.unwrap_or(usize::MAX);

        let mut entries = Vec::new();
        let mut reference_ranks = BTreeMap::new();
        let mut spliced = 0usize;

        for (position, item) in sorted.iter().enumerate() {
            let provisional = position + 1;
            let signal = item.signal;

            if self.references.contains(&signal.id) {
                reference_ranks.insert(signal.id.clone(), provisional);
                if !signal.include_in_output {
                    debug!(id = %signal.id, provisional, "reference item hidden from output");
                }
            }

            if !request.is_visible(signal) {
                spliced += 1;
                continue;
            }

            if entries.len() < limit {
                entries.push(RankEntry {
                    rank: provisional - spliced,
                    name: signal.name.clone(),
                    id: signal.id.clone(),
                });
            }
        }

        let objective = mean_rank(&reference_ranks);

        RankOutcome {
            ranking: Ranking { entries },
            objective,
            reference_ranks,
        }
    }

    /// Provisional ranks of the reference items without sorting the catalog.
    ///
    /// For each item, a binary search over the sorted references finds the
    /// first reference the item precedes; a prefix sum turns those counts into
    /// ranks. Matches the positions produced by [`RankingEngine::sorted`].
    pub fn reference_ranks(&self, alpha: f64) -> BTreeMap<String, usize> {
        let scored = self.scored(alpha);
        let mut refs: Vec<ScoredItem<'_>> = scored
            .iter()
            .filter(|s| self.references.contains(&s.signal.id))
            .copied()
            .collect();
        if refs.is_empty() {
            return BTreeMap::new();
        }
        refs.sort();

        let mut ahead = vec![0usize; refs.len() + 1];
        for item in &scored {
            let first_behind = refs.partition_point(|r| r <= item);
            ahead[first_behind] += 1;
        }

        let mut running = 0usize;
        refs.iter()
            .enumerate()
            .map(|(i, r)| {
                running += ahead[i];
                (r.signal.id.clone(), running + 1)
            })
            .collect()
    }

    /// Calibration objective: mean provisional reference rank.
    pub fn objective(&self, alpha: f64) -> Option<f64> {
        mean_rank(&self.reference_ranks(alpha))
    }
}

fn mean_rank(ranks: &BTreeMap<String, usize>) -> Option<f64> {
    if ranks.is_empty() {
        return None;
    }
    Some(ranks.values().sum::<usize>() as f64 / ranks.len() as f64)
}
