//! Catalog snapshot, reference set and keyword filters.
//!
//! The catalog is a JSON object keyed by app id:
//!
//! ```json
//! {
//!   "373390": {
//!     "name": "Contradiction",
//!     "positive": 1200, "negative": 80,
//!     "owners": 90000, "players": 40000,
//!     "median_playtime": 240, "average_playtime": 310,
//!     "show": true,
//!     "tags": ["Indie", "FMV"],
//!     "languages": { "en": { "positive": 900, "negative": 50 } }
//!   }
//! }
//! ```
//!
//! Items are stored in a `BTreeMap`, so every iteration over the catalog is in
//! id order and no result depends on hash-map layout.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::{GemError, Result};
use crate::types::Item;

/// Immutable snapshot of the product catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: BTreeMap<String, Item>,
}

impl Catalog {
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id.clone(), item)).collect(),
        }
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GemError::io(path, e))?;
        Self::from_json_str(&content).map_err(|e| match e {
            GemError::Malformed { what, message, .. } => GemError::Malformed {
                path: path.to_path_buf(),
                what,
                message,
            },
            other => other,
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: BTreeMap<String, Item> =
            serde_json::from_str(content).map_err(|e| GemError::Malformed {
                path: "<inline>".into(),
                what: "catalog",
                message: e.to_string(),
            })?;

        let items = raw
            .into_iter()
            .map(|(id, mut item)| {
                item.id = id.clone();
                (id, item)
            })
            .collect();

        Ok(Self { items })
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// Lookup that reports a missing id as `MissingData`.
    pub fn require(&self, id: &str) -> Result<&Item> {
        self.get(id).ok_or_else(|| GemError::MissingData(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every language code present in any item's breakdown.
    pub fn languages(&self) -> BTreeSet<String> {
        self.iter().flat_map(|item| item.languages.keys().cloned()).collect()
    }
}

/// Known hidden gems used as the calibration target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    ids: BTreeSet<String>,
}

impl ReferenceSet {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Reference ids that exist in the catalog. Missing ones are skipped.
    pub fn present_in<'a>(&'a self, catalog: &'a Catalog) -> impl Iterator<Item = &'a str> + 'a {
        self.iter().filter(move |id| catalog.contains(id))
    }
}

/// Include/exclude id filters resolved from store-tag keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordFilter {
    /// `None` means no include filter; `Some` restricts output to these ids.
    pub include: Option<BTreeSet<String>>,
    pub exclude: BTreeSet<String>,
}

impl KeywordFilter {
    /// Include: items tagged with ALL include keywords. Exclude: items tagged
    /// with ANY exclude keyword. Matching ignores ASCII case.
    pub fn resolve(catalog: &Catalog, include_keywords: &[String], exclude_keywords: &[String]) -> Self {
        let include = (!include_keywords.is_empty()).then(|| {
            catalog
                .iter()
                .filter(|item| include_keywords.iter().all(|k| item.has_tag(k)))
                .map(|item| item.id.clone())
                .collect()
        });

        let exclude = catalog
            .iter()
            .filter(|item| exclude_keywords.iter().any(|k| item.has_tag(k)))
            .map(|item| item.id.clone())
            .collect();

        Self { include, exclude }
    }
}
