//! URL classification into platform families.
//!
//! Patterns are tried in order and must match at the start of the string, so a
//! URL that only mentions another platform's domain in its path or query is
//! not misclassified.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::PlatformKind;

const PREFIX: &str = r"^(?:https?://)?(?:www\.)?";

static PLATFORM_PATTERNS: LazyLock<Vec<(PlatformKind, Regex)>> = LazyLock::new(|| {
    [
        (PlatformKind::Youtube, r"(?:youtube\.com|youtu\.be)/"),
        (PlatformKind::Twitter, r"(?:twitter\.com|x\.com)/"),
        (PlatformKind::Vimeo, r"vimeo\.com/"),
        (PlatformKind::Gag9, r"9gag\.com/"),
        (PlatformKind::Instagram, r"(?:instagram\.com|instagr\.am)/"),
        (PlatformKind::Facebook, r"(?:facebook\.com|fb\.watch)/"),
        (PlatformKind::Twitch, r"twitch\.tv/"),
    ]
    .into_iter()
    .map(|(kind, host)| (kind, compile_static_regex(&format!("{PREFIX}{host}"))))
    .collect()
});

fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Maps a URL to its platform, or [`PlatformKind::Unknown`] when nothing matches.
#[must_use]
pub fn classify(url: &str) -> PlatformKind {
    let url = url.trim();
    PLATFORM_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(url))
        .map_or(PlatformKind::Unknown, |(kind, _)| *kind)
}
