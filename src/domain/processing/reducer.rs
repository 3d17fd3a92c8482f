//! Consolidation of ordered partial analyses

use tracing::{info, warn};

/// Appended when the joined text exceeds its character budget
pub const TRUNCATION_MARKER: &str = "\n... [TRUNCATED]";

const SEPARATOR: &str = "\n\n";

/// Ordered partial analyses joined into one bounded context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedContext {
    text: String,
    fragments: usize,
    truncated: bool,
}

impl ConsolidatedContext {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of partial analyses that went in
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Join `ordered_texts` with a blank line and cap the result at `max_chars` characters.
///
/// Texts must already be in ordinal order. When the cap is exceeded the first
/// `max_chars` characters are kept and [`TRUNCATION_MARKER`] is appended.
pub fn reduce<S: AsRef<str>>(ordered_texts: &[S], max_chars: usize) -> ConsolidatedContext {
    let joined = ordered_texts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    let chars = joined.chars().count();

    info!(
        fragments = ordered_texts.len(),
        chars, "Consolidated partial analyses"
    );

    if chars <= max_chars {
        return ConsolidatedContext {
            text: joined,
            fragments: ordered_texts.len(),
            truncated: false,
        };
    }

    warn!(chars, max_chars, "Consolidated context too large, truncating");

    let cut = joined
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(joined.len());

    let mut text = String::with_capacity(cut + TRUNCATION_MARKER.len());
    text.push_str(&joined[..cut]);
    text.push_str(TRUNCATION_MARKER);

    ConsolidatedContext {
        text,
        fragments: ordered_texts.len(),
        truncated: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let context = reduce::<&str>(&[], 100);

        assert_eq!(context.as_str(), "");
        assert_eq!(context.fragments(), 0);
        assert!(!context.is_truncated());
    }

    #[test]
    fn test_joins_with_blank_line() {
        let context = reduce(&["first", "second", "third"], 1000);
        assert_eq!(context.as_str(), "first\n\nsecond\n\nthird");
    }

    #[test]
    fn test_exactly_at_cap_is_untouched() {
        let texts = ["abc", "de"];
        // "abc\n\nde" is 7 chars
        let context = reduce(&texts, 7);

        assert_eq!(context.as_str(), "abc\n\nde");
        assert!(!context.is_truncated());
    }

    #[test]
    fn test_truncation_keeps_cap_then_marker() {
        let texts = vec!["a".repeat(100), "b".repeat(100)];
        let context = reduce(&texts, 150);

        assert!(context.is_truncated());
        assert!(context.as_str().ends_with(TRUNCATION_MARKER));
        assert_eq!(
            context.as_str().chars().count(),
            150 + TRUNCATION_MARKER.chars().count()
        );
        assert!(context.as_str().starts_with(&"a".repeat(100)));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let texts = ["ñandú".repeat(10)];
        let context = reduce(&texts, 7);

        assert_eq!(context.as_str(), format!("ñandúña{}", TRUNCATION_MARKER));
    }
}
