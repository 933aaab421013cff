//! Keyword highlighting in replies.

use recall_core::Memory;

/// Opening highlight marker.
pub const KEYWORD_OPEN: &str = "[keyword]";
/// Closing highlight marker.
pub const KEYWORD_CLOSE: &str = "[/keyword]";

/// Wrap every literal occurrence of each memory keyword in marker tags.
///
/// Keywords are applied in memory order, then keyword order. Each
/// replacement runs over the output of the previous one, so a later keyword
/// that overlaps an earlier one (or the markers) wraps the already-tagged
/// text again.
#[must_use]
pub fn tag_keywords(text: &str, memories: &[Memory]) -> String {
    let mut tagged = text.to_string();
    for keyword in memories
        .iter()
        .filter_map(|m| m.keywords.as_deref())
        .flatten()
    {
        if keyword.is_empty() || !tagged.contains(keyword.as_str()) {
            continue;
        }
        tagged = tagged.replace(
            keyword.as_str(),
            &format!("{KEYWORD_OPEN}{keyword}{KEYWORD_CLOSE}"),
        );
    }
    tagged
}
