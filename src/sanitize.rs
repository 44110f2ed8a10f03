use once_cell::sync::Lazy;
use regex::Regex;

// `$-_` is a range (0x24..=0x5F), so the class also covers `:`, `/`, `?`, `=`, digits and uppercase.
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+")
        .expect("URL pattern is a valid regex")
});

/// Remove every embedded http(s) URL from `text`.
///
/// Matches are deleted outright; surrounding whitespace and punctuation stay
/// exactly as written. Text without a URL comes back unchanged.
pub fn strip_urls(text: &str) -> String {
    URL_PATTERN.replace_all(text, "").into_owned()
}
