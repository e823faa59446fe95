//! Markdown summary of the regional rankings.
//!
//! ```text
//! ## Language ISO 639-1
//! * en	   --->	English
//! * zh	   --->	Chinese
//!
//! ### Top 20 hidden gems for English speakers
//! 00001.	[...](...)
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use super::markdown::{regional_output_path, MarkdownRenderer};
use crate::error::{GemError, Result};
use crate::regional::{display_code, language_name, RegionalView};
use crate::types::Ranking;

/// Default number of entries per language in the summary.
pub const DEFAULT_SUMMARY_ENTRIES: usize = 20;

fn name_of(code: &str) -> &str {
    language_name(code).unwrap_or(code)
}

/// Build the summary from `(code, lines)` sections.
pub fn render_summary<'a, I>(sections: I, num_entries: usize) -> String
where
    I: IntoIterator<Item = (&'a str, Vec<String>)>,
{
    let sections: Vec<_> = sections.into_iter().collect();
    let mut out = String::new();

    let _ = writeln!(out, "## Language ISO 639-1");
    for (code, _) in &sections {
        let _ = writeln!(out, "* {}\t   --->\t{}", display_code(code), name_of(code));
    }
    out.push('\n');

    for (code, lines) in &sections {
        let _ = writeln!(
            out,
            "### Top {num_entries} hidden gems for {} speakers",
            name_of(code)
        );
        for line in lines.iter().take(num_entries) {
            let _ = writeln!(out, "{line}");
        }
        out.push('\n');
    }
    out
}

/// Summary straight from in-memory regional rankings.
pub fn summary_from_view(view: &RegionalView, renderer: &MarkdownRenderer, num_entries: usize) -> String {
    let sections = view.runs.iter().map(|(code, run)| {
        let lines = top_lines(&run.outcome.ranking, renderer, num_entries);
        (code.as_str(), lines)
    });
    render_summary(sections, num_entries)
}

/// Summary from previously written `hidden_gems_{code}.md` files.
pub fn summary_from_dir(dir: &Path, languages: &[String], num_entries: usize) -> Result<String> {
    let mut sections = Vec::with_capacity(languages.len());
    for code in languages {
        let path = regional_output_path(dir, code)?;
        let content = fs::read_to_string(&path).map_err(|e| GemError::io(&path, e))?;
        let lines = content
            .lines()
            .take(num_entries)
            .map(|l| l.trim().to_string())
            .collect();
        sections.push((code.as_str(), lines));
    }
    Ok(render_summary(sections, num_entries))
}

fn top_lines(ranking: &Ranking, renderer: &MarkdownRenderer, n: usize) -> Vec<String> {
    ranking.entries.iter().take(n).map(|e| renderer.entry(e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::markdown::write_artifact;

    #[test]
    fn test_summary_layout() {
        let sections = vec![
            ("en", vec!["00001.\ta".to_string(), "00002.\tb".to_string()]),
            ("zh-cn", vec!["00001.\tc".to_string()]),
        ];
        let text = render_summary(sections, 1);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "## Language ISO 639-1");
        assert_eq!(lines[1], "* en\t   --->\tEnglish");
        assert_eq!(lines[2], "* zh\t   --->\tChinese");
        assert_eq!(lines[4], "### Top 1 hidden gems for English speakers");
        assert_eq!(lines[5], "00001.\ta");
        assert_eq!(lines[7], "### Top 1 hidden gems for Chinese speakers");
        assert!(!text.contains("00002"));
    }

    #[test]
    fn test_summary_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = regional_output_path(dir.path(), "fr").unwrap();
        write_artifact(&path, "00001.\t[Un](u)\n00002.\t[Deux](d)\n00003.\t[Trois](t)\n").unwrap();

        let text = summary_from_dir(dir.path(), &["fr".to_string()], 2).unwrap();
        assert!(text.contains("### Top 2 hidden gems for French speakers"));
        assert!(text.contains("[Deux]"));
        assert!(!text.contains("[Trois]"));
    }

    #[test]
    fn test_missing_regional_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = summary_from_dir(dir.path(), &["de".to_string()], 5).unwrap_err();
        assert!(err.to_string().contains("hidden_gems_de.md"));
    }
}
