//! ANSI color utilities and badges for terminal run summaries.
//!
//! Badges mark where alpha came from and what went wrong with items:
//! - Alpha: [optimized], [cached], [fixed]
//! - Items: [no-votes], [inconsistent]
//!
//! Color scheme optimized for both light and dark terminals:
//! - High contrast for the headline numbers (alpha, objective)
//! - Muted colors for metadata

use owo_colors::{OwoColorize, Style};
use std::fmt;

use crate::calibration::AlphaSource;
use crate::ranking::RunOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Badge {
    /// Alpha found by differential evolution this run
    Optimized,
    /// Alpha from the dated calibration table
    Cached,
    /// Alpha given on the command line
    Fixed,
    /// Items without votes in scope (sorted last)
    NoVotes,
    /// Regional players estimate below regional reviews
    Inconsistent,
}

impl Badge {
    pub fn label(&self) -> &'static str {
        match self {
            Badge::Optimized => "optimized",
            Badge::Cached => "cached",
            Badge::Fixed => "fixed",
            Badge::NoVotes => "no-votes",
            Badge::Inconsistent => "inconsistent",
        }
    }

    pub fn style(&self) -> Style {
        match self {
            Badge::Optimized => Style::new().green().bold(),
            Badge::Cached => Style::new().yellow(),
            Badge::Fixed => Style::new().bright_blue(),
            Badge::NoVotes => Style::new().dimmed(),
            Badge::Inconsistent => Style::new().bright_red(),
        }
    }

    pub fn render(&self) -> String {
        format!("[{}]", self.label().style(self.style()))
    }

    pub fn for_source(source: &AlphaSource) -> Self {
        match source {
            AlphaSource::Optimized { .. } => Badge::Optimized,
            AlphaSource::Cached { .. } => Badge::Cached,
            AlphaSource::Fixed => Badge::Fixed,
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

pub struct Colorizer;

impl Colorizer {
    /// Scope header (bold blue)
    pub fn scope(s: &str) -> String {
        s.bright_blue().bold().to_string()
    }

    /// Headline number (bold cyan)
    pub fn number(s: &str) -> String {
        s.bright_cyan().bold().to_string()
    }

    pub fn warning(s: &str) -> String {
        s.yellow().to_string()
    }

    /// Dim text for secondary information
    pub fn dim(s: &str) -> String {
        s.dimmed().to_string()
    }
}

/// One-line summary of a run for stderr.
///
/// ```text
/// overall [optimized] alpha = 10^6.41  objective 3.00  shown 250/9872  [no-votes] 112
/// ```
pub fn run_summary(run: &RunOutcome) -> String {
    let calibration = &run.calibration;
    let mut parts = vec![
        Colorizer::scope(run.scope.label()),
        Badge::for_source(&calibration.source).render(),
        format!(
            "alpha = {}",
            Colorizer::number(&format!("10^{:.2}", calibration.log10_alpha()))
        ),
    ];

    if let Some(objective) = run.outcome.objective {
        parts.push(format!("objective {}", Colorizer::number(&format!("{objective:.2}"))));
    }

    parts.push(Colorizer::dim(&format!(
        "shown {}/{}",
        run.outcome.ranking.len(),
        run.stats.items
    )));

    if run.stats.no_votes > 0 {
        parts.push(format!("{} {}", Badge::NoVotes, run.stats.no_votes));
    }
    if run.stats.inconsistent > 0 {
        parts.push(format!(
            "{} {}",
            Badge::Inconsistent,
            Colorizer::warning(&run.stats.inconsistent.to_string())
        ));
    }

    parts.join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::Calibration;
    use crate::ranking::{RankOutcome, RunStats};
    use crate::types::VoteScope;

    #[test]
    fn test_badge_labels() {
        assert_eq!(Badge::for_source(&AlphaSource::Fixed), Badge::Fixed);
        assert_eq!(
            Badge::for_source(&AlphaSource::Cached {
                computed_on: "2018-03-22".into()
            }),
            Badge::Cached
        );
        for badge in [Badge::Optimized, Badge::NoVotes, Badge::Inconsistent] {
            assert!(badge.render().contains(badge.label()));
        }
    }

    #[test]
    fn test_run_summary_mentions_counts() {
        let run = RunOutcome {
            scope: VoteScope::Language("fr".into()),
            calibration: Calibration {
                alpha: 1e4,
                objective: Some(2.0),
                evaluations: 30,
                source: AlphaSource::Optimized {
                    generations: 1,
                    converged: true,
                },
            },
            prior: None,
            outcome: RankOutcome {
                objective: Some(2.0),
                ..Default::default()
            },
            stats: RunStats {
                items: 12,
                no_votes: 3,
                inconsistent: 1,
                references_present: 1,
            },
        };
        let line = run_summary(&run);
        assert!(line.contains("fr"));
        assert!(line.contains("10^4.00"));
        assert!(line.contains("0/12"));
        assert!(line.contains("no-votes"));
        assert!(line.contains("inconsistent"));
    }
}
