//! Output rendering - from rankings to markdown files and terminal summaries.
//!
//! - `markdown`: ranking lines, ids-only lists, artifact paths
//! - `readme`: summary of the regional rankings
//! - `colors`: colored one-line run summaries for stderr

mod colors;
mod markdown;
mod readme;

pub use colors::{run_summary, Badge, Colorizer};
pub use markdown::{
    regional_output_path, render_ids, write_artifact, MarkdownRenderer, ID_LIST_FILE, RANKING_FILE,
};
pub use readme::{render_summary, summary_from_dir, summary_from_view, DEFAULT_SUMMARY_ENTRIES};
