/// Prepares raw user text for feature extraction.
///
/// Lowercases every character, then drops every ASCII punctuation mark.
/// Letters, digits, whitespace and non-ASCII symbols pass through unchanged.
/// The vectorizer must have been fitted on text prepared the same way.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect()
}
