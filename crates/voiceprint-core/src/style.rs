//! Style-hint extraction from free-form requests.
//!
//! Users steer tone inline, e.g. `"Write about remote work [make this more
//! formal]"`. [`extract_style_hint`] pulls that instruction out so it can
//! be passed to the generator separately.

use std::sync::OnceLock;

use regex::Regex;

fn patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?i)\[make this (.*?)\]").expect("valid bracket pattern"),
            Regex::new(r"(?i)\(make this (.*?)\)").expect("valid paren pattern"),
            Regex::new(r"(?i)make this (more|less) (\w+)").expect("valid bare pattern"),
        ]
    })
}

/// Return the style instruction embedded in `query`, if any.
///
/// Patterns are tried in order: `[make this X]`, `(make this X)`, then a
/// bare `make this more|less <word>`. The first match wins.
///
/// ```rust
/// use voiceprint_core::style::extract_style_hint;
///
/// assert_eq!(
///     extract_style_hint("Draft a note [make this more formal]").as_deref(),
///     Some("more formal")
/// );
/// assert_eq!(extract_style_hint("Draft a note"), None);
/// ```
pub fn extract_style_hint(query: &str) -> Option<String> {
    let [bracket, paren, bare] = patterns();

    for pattern in [bracket, paren] {
        if let Some(caps) = pattern.captures(query) {
            let hint = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            if !hint.is_empty() {
                return Some(hint.to_string());
            }
        }
    }

    bare.captures(query)
        .map(|caps| format!("{} {}", &caps[1], &caps[2]).to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_form() {
        assert_eq!(
            extract_style_hint("Write about gardens [make this punchier and shorter]").as_deref(),
            Some("punchier and shorter")
        );
    }

    #[test]
    fn test_paren_form_case_insensitive() {
        assert_eq!(
            extract_style_hint("Intro for episode 4 (Make This warmer)").as_deref(),
            Some("warmer")
        );
    }

    #[test]
    fn test_bare_form() {
        assert_eq!(
            extract_style_hint("please make this MORE casual, thanks").as_deref(),
            Some("more casual")
        );
    }

    #[test]
    fn test_bracket_wins_over_bare() {
        assert_eq!(
            extract_style_hint("make this less formal [make this poetic]").as_deref(),
            Some("poetic")
        );
    }

    #[test]
    fn test_no_hint() {
        assert_eq!(extract_style_hint("A reflection on running"), None);
        assert_eq!(extract_style_hint("make this happen"), None);
    }
}
