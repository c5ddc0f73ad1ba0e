//! Token counting and link detection over raw post text.

use once_cell::sync::Lazy;
use regex::Regex;

static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+").expect("hashtag regex"));
static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+").expect("mention regex"));
static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("link regex"));

/// Stored content is capped at this many characters.
pub const MAX_CONTENT_CHARS: usize = 500;

pub fn count_hashtags(text: &str) -> usize {
    HASHTAG_RE.find_iter(text).count()
}

/// Counts `@handle` tokens, skipping the account's own handle (case-insensitive, exact).
pub fn count_mentions(text: &str, self_handle: &str) -> usize {
    let own = format!("@{}", self_handle.trim_start_matches('@')).to_lowercase();
    MENTION_RE
        .find_iter(text)
        .filter(|m| m.as_str().to_lowercase() != own)
        .count()
}

pub fn has_link(text: &str) -> bool {
    LINK_RE.is_match(text)
}

pub fn is_retweet_text(text: &str) -> bool {
    text.starts_with("RT @")
}

/// Truncates on character boundaries, never mid code point.
pub fn truncate_content(text: &str) -> String {
    text.chars().take(MAX_CONTENT_CHARS).collect()
}
