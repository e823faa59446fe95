//! gemrank-regional: one hidden-gems ranking per language
//!
//! ## Usage
//!
//! ```bash
//! # Rank every default language, writing regional/hidden_gems_{lang}.md
//! gemrank-regional catalog.json
//!
//! # Rebuild the language breakdown from raw reviews first
//! gemrank-regional catalog.json --reviews reviews.json
//!
//! # Two languages, cached alpha, plus a README summary
//! gemrank-regional catalog.json --languages en,fr --no-optimize --readme README.md
//! ```
//!
//! ## Output Layout
//!
//! ```text
//! <output-dir>/
//!   hidden_gems_bg.md
//!   hidden_gems_cs.md
//!   ...
//!   hidden_gems_zh-cn.md
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use gemrank::cache::RedbDetectionCache;
use gemrank::regional::{attach_breakdowns, summarize_reviews, Review, TagDetector};
use gemrank::rendering::{
    regional_output_path, run_summary, summary_from_view, write_artifact, MarkdownRenderer,
    DEFAULT_SUMMARY_ENTRIES,
};
use gemrank::{logging, Catalog, Config, RegionalPartitioner};

#[derive(Parser, Debug)]
#[command(name = "gemrank-regional")]
#[command(about = "Hidden-gems rankings per language, each calibrated independently")]
struct Args {
    /// Catalog JSON (app id -> record, with per-language votes)
    #[arg(value_name = "CATALOG")]
    catalog: PathBuf,

    /// Full product catalog, for the whole_catalog prior scope
    #[arg(long, value_name = "PATH")]
    whole_catalog: Option<PathBuf>,

    /// Configuration file (default: gemrank.toml, searched upwards)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory of the regional rankings
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Language codes (comma-separated); default: the configured list
    #[arg(long, value_delimiter = ',')]
    languages: Vec<String>,

    /// Rank languages one after another
    #[arg(long)]
    sequential: bool,

    /// Use the cached alpha instead of calibrating
    #[arg(long)]
    no_optimize: bool,

    /// Use this alpha for every language
    #[arg(long)]
    alpha: Option<f64>,

    /// Raw reviews JSON (app id -> reviews) to rebuild the language breakdown
    #[arg(long, value_name = "PATH")]
    reviews: Option<PathBuf>,

    /// Root of the detection cache (.gemrank.cache/)
    #[arg(long, default_value = ".")]
    cache_root: PathBuf,

    /// Also write a markdown summary of every language
    #[arg(long, value_name = "PATH")]
    readme: Option<PathBuf>,

    /// Entries per language in the summary
    #[arg(long, default_value_t = DEFAULT_SUMMARY_ENTRIES)]
    readme_entries: usize,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    diagnose: bool,
}

fn load_reviews(path: &Path) -> Result<BTreeMap<String, Vec<Review>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read reviews '{}'", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Malformed reviews '{}'", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, args.diagnose);

    let mut config = match &args.config {
        Some(path) => Config::load_file(path)?,
        None => Config::load(&std::env::current_dir().context("Failed to resolve current directory")?)?,
    };
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if !args.languages.is_empty() {
        config.languages = args.languages.clone();
    }
    if args.sequential {
        config.parallel_regions = false;
    }
    if args.no_optimize {
        config.optimize = false;
    }
    config.validate().context("Invalid configuration")?;

    if args.verbose {
        eprintln!("🌍 gemrank-regional v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("{}", config.display_summary());
    }

    let mut catalog = Catalog::load(&args.catalog)
        .with_context(|| format!("Failed to load catalog '{}'", args.catalog.display()))?;

    if let Some(path) = &args.reviews {
        let reviews = load_reviews(path)?;
        let mut cache = RedbDetectionCache::open(&args.cache_root)?;
        let breakdowns = summarize_reviews(reviews, &TagDetector, &mut cache, config.cache_flush_every)?;
        if args.verbose {
            eprintln!(
                "✓ Language breakdown for {} apps ({} cached detections)",
                breakdowns.len(),
                cache.stats().entries
            );
        }
        catalog = attach_breakdowns(&catalog, breakdowns);
    }

    let whole_catalog = match &args.whole_catalog {
        Some(path) => Some(
            Catalog::load(path)
                .with_context(|| format!("Failed to load whole catalog '{}'", path.display()))?,
        ),
        None => None,
    };

    let view = RegionalPartitioner::new(&config, &catalog)
        .with_whole_catalog(whole_catalog.as_ref().unwrap_or(&catalog))
        .with_alpha(args.alpha)
        .partition()?;

    let renderer = MarkdownRenderer::from_config(&config);
    for (code, run) in &view.runs {
        let path = regional_output_path(&config.output_dir, code)?;
        write_artifact(&path, &renderer.render(&run.outcome.ranking))?;
        if args.verbose {
            eprintln!("{}", run_summary(run));
        }
    }

    if let Some(readme) = &args.readme {
        write_artifact(readme, &summary_from_view(&view, &renderer, args.readme_entries))?;
    }

    if args.verbose {
        eprintln!(
            "✓ Wrote {} rankings to {} ({} skipped)",
            view.runs.len(),
            config.output_dir.display(),
            view.skipped.len()
        );
    }

    Ok(())
}
