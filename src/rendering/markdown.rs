//! Markdown and id-list rendering of a ranking.
//!
//! ```text
//! 00001.	[Contradiction](http://store.steampowered.com/app/373390)
//! 00002.	[Demo](http://store.steampowered.com/app/10    )
//! ```
//!
//! The url is left-aligned in a fixed-width field so the closing parentheses
//! line up in a plain-text viewer.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{Config, DEFAULT_STORE_URL, DEFAULT_URL_WIDTH};
use crate::error::{GemError, Result};
use crate::types::{RankEntry, Ranking};

/// File name of the overall markdown ranking.
pub const RANKING_FILE: &str = "hidden_gems.md";

/// File name of the ids-only ranking.
pub const ID_LIST_FILE: &str = "idlist.txt";

#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    store_url: String,
    url_width: usize,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_URL, DEFAULT_URL_WIDTH)
    }
}

impl MarkdownRenderer {
    pub fn new(store_url: impl Into<String>, url_width: usize) -> Self {
        Self {
            store_url: store_url.into(),
            url_width,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.store_url.clone(), config.url_width)
    }

    pub fn entry(&self, entry: &RankEntry) -> String {
        let url = format!("{}{}", self.store_url, entry.id);
        format!(
            "{:05}.\t[{}]({:<width$})",
            entry.rank,
            entry.name,
            url,
            width = self.url_width
        )
    }

    /// One line per entry, newline-terminated.
    pub fn render(&self, ranking: &Ranking) -> String {
        ranking
            .entries
            .iter()
            .map(|e| self.entry(e) + "\n")
            .collect()
    }
}

/// One id per line, newline-terminated.
pub fn render_ids(ranking: &Ranking) -> String {
    ranking.entries.iter().map(|e| format!("{}\n", e.id)).collect()
}

pub fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| GemError::io(path, e))
}

/// `{dir}/hidden_gems_{code}.md`, creating `dir` if absent.
pub fn regional_output_path(dir: &Path, code: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| GemError::io(dir, e))?;
    Ok(dir.join(format!("hidden_gems_{code}.md")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking() -> Ranking {
        Ranking {
            entries: vec![
                RankEntry {
                    rank: 1,
                    name: "Contradiction".into(),
                    id: "373390".into(),
                },
                RankEntry {
                    rank: 2,
                    name: "Other".into(),
                    id: "10".into(),
                },
            ],
        }
    }

    #[test]
    fn test_entry_format() {
        let renderer = MarkdownRenderer::default();
        assert_eq!(
            renderer.entry(&ranking().entries[0]),
            "00001.\t[Contradiction](http://store.steampowered.com/app/373390)"
        );
        // Shorter urls are padded to the field width
        assert_eq!(
            renderer.entry(&ranking().entries[1]),
            "00002.\t[Other](http://store.steampowered.com/app/10    )"
        );
    }

    #[test]
    fn test_long_url_is_not_truncated() {
        let renderer = MarkdownRenderer::new("https://example.org/app/", 5);
        let line = renderer.entry(&ranking().entries[1]);
        assert_eq!(line, "00002.\t[Other](https://example.org/app/10)");
    }

    #[test]
    fn test_render_and_ids() {
        let r = ranking();
        let md = MarkdownRenderer::default().render(&r);
        assert_eq!(md.lines().count(), 2);
        assert!(md.ends_with('\n'));
        assert_eq!(render_ids(&r), "373390\n10\n");
        assert_eq!(render_ids(&Ranking::default()), "");
    }

    #[test]
    fn test_regional_path_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("regional");
        let path = regional_output_path(&out, "zh-cn").unwrap();
        assert!(out.is_dir());
        assert_eq!(path, out.join("hidden_gems_zh-cn.md"));

        write_artifact(&path, "x\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "x\n");
    }
}
