//! Language codes: Steam review tags to ISO 639-1, and display names.
//!
//! Steam tags reviews with its own language names (`english`, `schinese`,
//! `brazilian`, `koreana`, ...). Rankings are keyed by ISO 639-1 codes, with
//! Simplified/Traditional Chinese folded into `zh-cn` (the code language
//! detectors report for Chinese text). Display uses plain `zh`.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;

use crate::error::{GemError, Result};

/// Steam review tag -> normalized code.
static STEAM_TAGS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("arabic", "ar"),
        ("brazilian", "pt"),
        ("bulgarian", "bg"),
        ("czech", "cs"),
        ("danish", "da"),
        ("dutch", "nl"),
        ("english", "en"),
        ("finnish", "fi"),
        ("french", "fr"),
        ("german", "de"),
        ("greek", "el"),
        ("hungarian", "hu"),
        ("indonesian", "id"),
        ("italian", "it"),
        ("japanese", "ja"),
        ("koreana", "ko"),
        ("korean", "ko"),
        ("latam", "es"),
        ("norwegian", "no"),
        ("polish", "pl"),
        ("portuguese", "pt"),
        ("romanian", "ro"),
        ("russian", "ru"),
        ("schinese", "zh-cn"),
        ("spanish", "es"),
        ("swedish", "sv"),
        ("tchinese", "zh-cn"),
        ("thai", "th"),
        ("turkish", "tr"),
        ("ukrainian", "uk"),
        ("vietnamese", "vi"),
    ])
});

/// Normalized code -> English language name.
static LANGUAGE_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ar", "Arabic"),
        ("bg", "Bulgarian"),
        ("cs", "Czech"),
        ("da", "Danish"),
        ("de", "German"),
        ("el", "Greek"),
        ("en", "English"),
        ("es", "Spanish"),
        ("fi", "Finnish"),
        ("fr", "French"),
        ("hu", "Hungarian"),
        ("id", "Indonesian"),
        ("it", "Italian"),
        ("ja", "Japanese"),
        ("ko", "Korean"),
        ("nl", "Dutch"),
        ("no", "Norwegian"),
        ("pl", "Polish"),
        ("pt", "Portuguese"),
        ("ro", "Romanian"),
        ("ru", "Russian"),
        ("sv", "Swedish"),
        ("th", "Thai"),
        ("tr", "Turkish"),
        ("uk", "Ukrainian"),
        ("vi", "Vietnamese"),
        ("zh-cn", "Chinese"),
    ])
});

/// Normalize a Steam tag or ISO code.
///
/// Accepts Steam tags (`schinese`) and codes that are already normalized
/// (`fr`, `zh-cn`, `zh`). Matching ignores ASCII case and surrounding spaces.
pub fn normalize_language_code(tag: &str) -> Result<String> {
    let key = tag.trim().to_ascii_lowercase();
    if let Some(code) = STEAM_TAGS.get(key.as_str()) {
        return Ok((*code).to_string());
    }
    if key == "zh" || key == "zh-tw" {
        return Ok("zh-cn".to_string());
    }
    if LANGUAGE_NAMES.contains_key(key.as_str()) {
        return Ok(key);
    }
    Err(GemError::UnknownLanguage(tag.to_string()))
}

/// Normalize a tag, falling back to a majority vote over the detected
/// languages of the reviews carrying that tag.
///
/// Ties go to the alphabetically smallest code. Detections of `unknown` are
/// ignored.
pub fn normalize_or_vote<'a>(tag: &str, detected: impl IntoIterator<Item = &'a str>) -> Result<String> {
    if let Ok(code) = normalize_language_code(tag) {
        return Ok(code);
    }

    let mut votes: BTreeMap<String, usize> = BTreeMap::new();
    for code in detected {
        if let Ok(code) = normalize_language_code(code) {
            *votes.entry(code).or_insert(0) += 1;
        }
    }

    // max_by_key keeps the last maximum; iterate in reverse so ties resolve
    // to the smallest code
    votes
        .into_iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(code, _)| code)
        .ok_or_else(|| GemError::UnknownLanguage(tag.to_string()))
}

/// Code shown to readers: `zh-cn` is displayed as `zh`.
pub fn display_code(code: &str) -> &str {
    if code == "zh-cn" {
        "zh"
    } else {
        code
    }
}

pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGE_NAMES.get(code).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steam_tags() {
        assert_eq!(normalize_language_code("english").unwrap(), "en");
        assert_eq!(normalize_language_code("schinese").unwrap(), "zh-cn");
        assert_eq!(normalize_language_code("tchinese").unwrap(), "zh-cn");
        assert_eq!(normalize_language_code("brazilian").unwrap(), "pt");
        assert_eq!(normalize_language_code("koreana").unwrap(), "ko");
        assert_eq!(normalize_language_code(" French ").unwrap(), "fr");
    }

    #[test]
    fn test_codes_pass_through() {
        assert_eq!(normalize_language_code("fr").unwrap(), "fr");
        assert_eq!(normalize_language_code("zh-cn").unwrap(), "zh-cn");
        assert_eq!(normalize_language_code("zh").unwrap(), "zh-cn");
    }

    #[test]
    fn test_default_languages_are_known() {
        for code in crate::config::DEFAULT_LANGUAGES {
            assert_eq!(normalize_language_code(code).unwrap(), *code);
            assert!(language_name(code).is_some(), "no name for {code}");
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            normalize_language_code("klingon"),
            Err(GemError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_majority_vote_fallback() {
        let code = normalize_or_vote("klingon", ["de", "en", "de", "unknown"]).unwrap();
        assert_eq!(code, "de");

        // Tie: smallest code wins
        let code = normalize_or_vote("klingon", ["fr", "de"]).unwrap();
        assert_eq!(code, "de");

        assert!(normalize_or_vote("klingon", ["unknown"]).is_err());
        // Known tags never vote
        assert_eq!(normalize_or_vote("russian", ["en", "en"]).unwrap(), "ru");
    }

    #[test]
    fn test_display() {
        assert_eq!(display_code("zh-cn"), "zh");
        assert_eq!(display_code("fr"), "fr");
        assert_eq!(language_name("zh-cn"), Some("Chinese"));
    }
}
