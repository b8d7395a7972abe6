//! URL reference utilities.
//!
//! Helpers for classifying and splitting asset references found in text
//! assets (stylesheet `url(...)` and `@import` targets).

/// Check if a reference is external (has a URL scheme like http:, data:, etc.)
///
/// A valid scheme must:
/// - Have at least 1 character before the colon
/// - Only contain ASCII alphanumeric or `+`, `-`, `.`
///
/// Protocol-relative references (`//host/...`) are also treated as external.
///
/// # Examples
/// ```ignore
/// assert!(is_external_link("https://example.com/a.png"));
/// assert!(is_external_link("data:image/png;base64,AAAA"));
/// assert!(is_external_link("//cdn.example.com/a.png"));
/// assert!(!is_external_link("../images/a.png"));
/// ```
#[inline]
pub fn is_external_link(link: &str) -> bool {
    link.starts_with("//")
        || link.find(':').is_some_and(|pos| {
            pos > 0
                && link[..pos]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        })
}

/// Split a reference into its path and a `?query` / `#fragment` suffix.
///
/// The suffix keeps its leading `?` or `#` so it can be re-appended verbatim.
///
/// # Examples
/// ```ignore
/// assert_eq!(split_path_suffix("font.woff?v=2#iefix"), ("font.woff", "?v=2#iefix"));
/// assert_eq!(split_path_suffix("logo.png"), ("logo.png", ""));
/// ```
#[inline]
pub fn split_path_suffix(link: &str) -> (&str, &str) {
    match link.find(['?', '#']) {
        Some(pos) => link.split_at(pos),
        None => (link, ""),
    }
}
