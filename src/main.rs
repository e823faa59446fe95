//! gemrank CLI - hidden gems of a game catalog
//!
//! Orchestrates the full pipeline for the overall ranking:
//!
//! 1. Configuration: gemrank.toml (walking up from the current directory), then flags
//! 2. Catalog: JSON snapshot of every product's votes and players
//! 3. Signals: quality (Wilson bound or Bayesian) and popularity per item
//! 4. Alpha: calibrated against the reference gems, cached, or given
//! 5. Ranking: sort, compaction, keyword/id filters, truncation
//! 6. Rendering: hidden_gems.md and idlist.txt
//!
//! Logs go to stderr; `--stdout` echoes the ranking to stdout for piping.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;

use gemrank::calibration::{best_point, objective_curve, pinned_to_bound, Calibrator};
use gemrank::config::{Config, TopEntries};
use gemrank::rendering::{
    render_ids, run_summary, write_artifact, MarkdownRenderer, ID_LIST_FILE, RANKING_FILE,
};
use gemrank::{logging, Catalog, PopularityMeasure, PriorScope, QualityMeasure, RankingEngine, RankingRun, VoteScope};

/// Rank a game catalog by hidden-gem score
///
/// Combines review quality with a popularity decay whose scale (alpha) is
/// calibrated so that known hidden gems rank as high as possible.
///
/// Examples:
///   gemrank catalog.json                          # Calibrate and rank
///   gemrank catalog.json --quality bayesian       # Bayesian quality
///   gemrank catalog.json --no-optimize --top all  # Cached alpha, full list
///   gemrank catalog.json --sweep 40               # Inspect the objective
#[derive(Parser, Debug)]
#[command(name = "gemrank")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// Catalog JSON (app id -> record)
    #[arg(value_name = "CATALOG")]
    pub catalog: PathBuf,

    /// Full product catalog, for the whole_catalog prior scope
    ///
    /// Defaults to CATALOG itself.
    #[arg(long, value_name = "PATH")]
    pub whole_catalog: Option<PathBuf>,

    /// Configuration file (default: gemrank.toml, searched upwards)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Quality measure: lower_confidence_bound or bayesian
    #[arg(long)]
    pub quality: Option<QualityMeasure>,

    /// Popularity measure: players or reviews
    #[arg(long)]
    pub popularity: Option<PopularityMeasure>,

    /// Prior scope: whole_catalog, subset_pooled or subset_per_language
    #[arg(long)]
    pub prior_scope: Option<PriorScope>,

    /// Confidence of the Wilson lower bound, in (0, 1)
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Number of entries to render, or "all"
    #[arg(short = 'n', long)]
    pub top: Option<TopEntries>,

    /// Known hidden gem used as calibration target (repeatable)
    #[arg(long = "reference", value_name = "ID")]
    pub references: Vec<String>,

    /// Only show these ids (comma-separated)
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub include_ids: Vec<String>,

    /// Never show these ids (comma-separated)
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub exclude_ids: Vec<String>,

    /// Only show items tagged with every such keyword (repeatable)
    #[arg(long = "include-keyword", value_name = "TAG")]
    pub include_keywords: Vec<String>,

    /// Hide items tagged with any such keyword (repeatable)
    #[arg(long = "exclude-keyword", value_name = "TAG")]
    pub exclude_keywords: Vec<String>,

    /// Use the cached alpha instead of calibrating
    #[arg(long)]
    pub no_optimize: bool,

    /// Use this alpha, skipping calibration and the cache
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Seed of the differential evolution search
    #[arg(long)]
    pub seed: Option<u64>,

    /// Markdown ranking output
    #[arg(short, long, default_value = RANKING_FILE)]
    pub output: PathBuf,

    /// Ids-only output
    #[arg(long, default_value = ID_LIST_FILE)]
    pub id_list: PathBuf,

    /// Also print the ranking to stdout
    #[arg(long)]
    pub stdout: bool,

    /// Print the objective at N log-spaced alphas and exit
    ///
    /// Shows the plateaus of the mean reference rank and whether the best
    /// value sits on a search bound.
    #[arg(long, value_name = "N")]
    pub sweep: Option<usize>,

    /// Verbose output (info logs and a run summary)
    #[arg(short, long)]
    pub verbose: bool,

    /// Diagnostic output (debug logs)
    #[arg(long)]
    pub diagnose: bool,
}

impl Cli {
    /// Flags override file values.
    fn apply(&self, config: &mut Config) {
        if let Some(q) = self.quality {
            config.quality = q;
        }
        if let Some(p) = self.popularity {
            config.popularity = p;
        }
        if let Some(s) = self.prior_scope {
            config.prior_scope = s;
        }
        if let Some(c) = self.confidence {
            config.confidence = c;
        }
        if let Some(top) = self.top {
            config.top = top;
        }
        if !self.references.is_empty() {
            config.reference_ids = self.references.clone();
        }
        if !self.include_ids.is_empty() {
            config.include_ids = self.include_ids.clone();
        }
        config.exclude_ids.extend(self.exclude_ids.iter().cloned());
        if !self.include_keywords.is_empty() {
            config.include_keywords = self.include_keywords.clone();
        }
        config.exclude_keywords.extend(self.exclude_keywords.iter().cloned());
        if self.no_optimize {
            config.optimize = false;
        }
        if let Some(seed) = self.seed {
            config.search.seed = seed;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.diagnose);

    let mut config = match &cli.config {
        Some(path) => Config::load_file(path)?,
        None => {
            let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
            Config::load(&cwd)?
        }
    };
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    if cli.verbose {
        eprintln!("💎 gemrank v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("{}", config.display_summary());
    }

    let catalog = Catalog::load(&cli.catalog)
        .with_context(|| format!("Failed to load catalog '{}'", cli.catalog.display()))?;
    let whole_catalog = match &cli.whole_catalog {
        Some(path) => Some(
            Catalog::load(path)
                .with_context(|| format!("Failed to load whole catalog '{}'", path.display()))?,
        ),
        None => None,
    };

    if cli.verbose {
        eprintln!("✓ Loaded {} items", catalog.len());
    }

    let run = RankingRun::new(&config, &catalog)
        .with_whole_catalog(whole_catalog.as_ref().unwrap_or(&catalog))
        .with_alpha(cli.alpha);

    if let Some(points) = cli.sweep {
        return sweep(&run, &config, points);
    }

    let outcome = run.run(&VoteScope::Overall)?;

    let renderer = MarkdownRenderer::from_config(&config);
    let markdown = renderer.render(&outcome.outcome.ranking);
    write_artifact(&cli.output, &markdown)?;
    write_artifact(&cli.id_list, &render_ids(&outcome.outcome.ranking))?;

    if cli.stdout {
        print!("{markdown}");
    }

    if cli.verbose {
        eprintln!("{}", run_summary(&outcome));
        for (id, rank) in &outcome.outcome.reference_ranks {
            let name = catalog.get(id).map(|item| item.name.as_str()).unwrap_or(id);
            eprintln!("   reference {name} ({id}) at provisional rank {rank}");
        }
        eprintln!(
            "✓ Wrote {} and {}",
            cli.output.display(),
            cli.id_list.display()
        );
    }

    Ok(())
}

/// Objective curve over the calibrator's search interval.
fn sweep(run: &RankingRun<'_>, config: &Config, points: usize) -> Result<()> {
    let scope = VoteScope::Overall;
    let prior = run.prior(&scope)?;
    let signals = run.signals(&scope, prior)?;
    let engine = RankingEngine::new(&signals, run.references());
    let range = Calibrator::new(config.search).search_bounds(&signals)?;

    let curve = objective_curve(&engine, &range, points);
    if curve.is_empty() {
        anyhow::bail!("no reference-ids are present in the catalog; nothing to sweep");
    }

    for point in &curve {
        println!("{:.3}\t{:.3}", point.alpha.log10(), point.objective);
    }

    if let Some(best) = best_point(&curve) {
        eprintln!(
            "best objective {:.2} at alpha = 10^{:.2}",
            best.objective,
            best.alpha.log10()
        );
    }
    if pinned_to_bound(&curve) {
        warn!("best objective sits on a search bound; consider widening search.upper-bound");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "gemrank",
            "catalog.json",
            "--quality",
            "bayesian",
            "--top",
            "all",
            "--reference",
            "1",
            "--reference",
            "2",
            "--exclude-ids",
            "7,8",
            "--no-optimize",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.quality, QualityMeasure::Bayesian);
        assert_eq!(config.top, TopEntries::ALL);
        assert_eq!(config.reference_ids, vec!["1", "2"]);
        assert_eq!(config.exclude_ids, vec!["7", "8"]);
        assert!(!config.optimize);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["gemrank", "catalog.json"]);
        assert_eq!(cli.output, PathBuf::from(RANKING_FILE));
        assert_eq!(cli.id_list, PathBuf::from(ID_LIST_FILE));
        assert!(cli.sweep.is_none());
    }
}
