//! Column identifier normalization.

use std::sync::LazyLock;

use regex::Regex;

// SAFETY: These regexes are compile-time constants and are validated by tests.
static ACRONYM_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("static regex must compile"));
static WORD_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("static regex must compile"));

/// Converts a raw column name into its canonical snake-case identifier.
///
/// An underscore is inserted between a run of capitals and a following
/// capitalized word, and between a lower-case letter or digit and a following
/// capital. Hyphens become underscores and the result is lower-cased. Dots
/// are left alone.
///
/// # Examples
///
/// ```
/// use schema_docs_core::normalize_case;
///
/// assert_eq!(normalize_case("userId"), "user_id");
/// assert_eq!(normalize_case("HTTPRequest"), "http_request");
/// assert_eq!(normalize_case("link-click_targetUrl"), "link_click_target_url");
/// ```
pub fn normalize_case(text: &str) -> String {
    let split_acronyms = ACRONYM_BOUNDARY.replace_all(text, "${1}_${2}");
    let split_words = WORD_BOUNDARY.replace_all(&split_acronyms, "${1}_${2}");
    split_words.replace('-', "_").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case() {
        assert_eq!(normalize_case("elementClasses"), "element_classes");
        assert_eq!(normalize_case("targetUrl"), "target_url");
    }

    #[test]
    fn test_acronym_runs() {
        assert_eq!(normalize_case("XMLHttpRequest"), "xml_http_request");
        assert_eq!(normalize_case("getHTTPResponse"), "get_http_response");
        assert_eq!(normalize_case("ID"), "id");
    }

    #[test]
    fn test_digits_before_capital() {
        assert_eq!(normalize_case("sha256Hash"), "sha256_hash");
    }

    #[test]
    fn test_hyphens_and_dots() {
        assert_eq!(normalize_case("my-alias_page.viewId"), "my_alias_page.view_id");
    }

    #[test]
    fn test_already_normalized_is_unchanged() {
        assert_eq!(normalize_case("event_id"), "event_id");
        assert_eq!(normalize_case(""), "");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_case("someMixedCASEValue");
        assert_eq!(normalize_case(&once), once);
    }
}
