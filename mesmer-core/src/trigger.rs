//! Keyword trigger evaluation.

/// Check whether a message should start a session.
///
/// Matches only when the bot was mentioned AND the text contains any
/// configured keyword as a case-sensitive substring. The keyword list is
/// small and ordered; the first hit short-circuits. Blank keywords are
/// skipped, and an empty list never matches.
pub fn matches(text: &str, is_mentioned: bool, keywords: &[String]) -> bool {
    if !is_mentioned {
        return false;
    }

    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .any(|k| text.contains(k.as_str()))
}
