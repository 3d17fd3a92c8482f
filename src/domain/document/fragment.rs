//! Fragments of a split document and their partial analyses

use bytes::Bytes;

use super::DocumentFormat;

/// One ordered slice of a document, analysed independently of the others
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    ordinal: usize,
    bytes: Bytes,
    format: DocumentFormat,
}

impl Fragment {
    /// Create a fragment. Ordinals are 1-based.
    pub fn new(ordinal: usize, bytes: impl Into<Bytes>, format: DocumentFormat) -> Self {
        Self {
            ordinal,
            bytes: bytes.into(),
            format,
        }
    }

    /// Number a list of parts 1..=N in the order given
    pub fn sequence<I, B>(parts: I, format: &DocumentFormat) -> Vec<Self>
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        parts
            .into_iter()
            .enumerate()
            .map(|(i, part)| Self::new(i + 1, part, format.clone()))
            .collect()
    }

    /// The whole document as a single fragment
    pub fn whole(bytes: impl Into<Bytes>, format: &DocumentFormat) -> Self {
        Self::new(1, bytes, format.clone())
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn format(&self) -> &DocumentFormat {
        &self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Payload display name for this fragment of `base_name`
    pub fn payload_name(&self, base_name: &str) -> String {
        format!("{} part {}", base_name, self.ordinal)
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// Check that ordinals form exactly the range 1..=N in order
pub fn has_contiguous_ordinals(fragments: &[Fragment]) -> bool {
    fragments
        .iter()
        .enumerate()
        .all(|(i, f)| f.ordinal() == i + 1)
}

/// Outcome of analysing one fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialResult {
    pub ordinal: usize,
    pub text: String,
    /// True when the text is a placeholder standing in for a failed call
    pub degraded: bool,
}

impl PartialResult {
    pub fn new(ordinal: usize, text: impl Into<String>) -> Self {
        Self {
            ordinal,
            text: text.into(),
            degraded: false,
        }
    }

    /// Placeholder for a fragment whose remote call failed
    pub fn placeholder(ordinal: usize) -> Self {
        Self {
            ordinal,
            text: format!("[Fragment {}: no information extracted]", ordinal),
            degraded: true,
        }
    }
}

/// Sort results into document order and return their texts
pub fn into_ordered_texts(mut results: Vec<PartialResult>) -> Vec<String> {
    results.sort_by_key(|r| r.ordinal);
    results.into_iter().map(|r| r.text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_numbers_from_one() {
        let fragments = Fragment::sequence(
            vec![b"aa".to_vec(), b"bb".to_vec(), b"cc".to_vec()],
            &DocumentFormat::Txt,
        );

        let ordinals: Vec<usize> = fragments.iter().map(|f| f.ordinal()).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
        assert!(has_contiguous_ordinals(&fragments));
        assert!(fragments.iter().all(|f| f.format() == &DocumentFormat::Txt));
    }

    #[test]
    fn test_contiguity_detects_gaps() {
        let fragments = vec![
            Fragment::new(1, b"a".to_vec(), DocumentFormat::Txt),
            Fragment::new(3, b"b".to_vec(), DocumentFormat::Txt),
        ];
        assert!(!has_contiguous_ordinals(&fragments));
        assert!(has_contiguous_ordinals(&[]));
    }

    #[test]
    fn test_payload_name() {
        let fragment = Fragment::new(2, b"x".to_vec(), DocumentFormat::Pdf);
        assert_eq!(fragment.payload_name("progit pdf"), "progit pdf part 2");
    }

    #[test]
    fn test_placeholder() {
        let result = PartialResult::placeholder(4);
        assert!(result.degraded);
        assert_eq!(result.text, "[Fragment 4: no information extracted]");
    }

    #[test]
    fn test_into_ordered_texts_sorts_by_ordinal() {
        let results = vec![
            PartialResult::new(3, "third"),
            PartialResult::new(1, "first"),
            PartialResult::new(2, "second"),
        ];

        assert_eq!(into_ordered_texts(results), vec!["first", "second", "third"]);
    }
}
