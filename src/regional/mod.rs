//! Language/region partitioned rankings.
//!
//! - `language`: Steam tags to ISO 639-1 codes, display names
//! - `breakdown`: per-language vote sub-counts from raw reviews
//! - `partition`: one independent ranking per language

mod breakdown;
mod language;
mod partition;

pub use breakdown::{
    attach_breakdowns, summarize_reviews, LanguageBreakdown, LanguageDetector, Review, TagDetector,
    UNKNOWN_LANGUAGE,
};
pub use language::{display_code, language_name, normalize_language_code, normalize_or_vote};
pub use partition::{RegionalPartitioner, RegionalView};
