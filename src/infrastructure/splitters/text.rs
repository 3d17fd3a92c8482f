//! Line-boundary splitting for text-like formats

use bytes::Bytes;

use crate::domain::document::{DocumentFormat, Fragment};
use crate::domain::splitting::{validate_limit, FragmentSplitter, SplitError};

/// Splits text-like documents into exact byte ranges.
///
/// Cuts after the last newline inside each window, falling back to the last
/// UTF-8 character boundary when a window holds no newline. Concatenating the
/// fragments reproduces the input byte for byte.
#[derive(Debug, Clone, Default)]
pub struct LineSplitter;

impl LineSplitter {
    pub fn new() -> Self {
        Self
    }
}

impl FragmentSplitter for LineSplitter {
    fn supports(&self, format: &DocumentFormat) -> bool {
        format.is_line_oriented()
    }

    fn split(
        &self,
        bytes: &Bytes,
        format: &DocumentFormat,
        max_fragment_bytes: usize,
    ) -> Result<Vec<Fragment>, SplitError> {
        validate_limit(max_fragment_bytes)?;

        if !self.supports(format) {
            return Err(SplitError::Unsupported(format.clone()));
        }

        if bytes.is_empty() {
            return Ok(vec![]);
        }

        if bytes.len() <= max_fragment_bytes {
            return Ok(vec![Fragment::whole(bytes.clone(), format)]);
        }

        let mut parts = Vec::new();
        let mut start = 0;

        while start < bytes.len() {
            let target_end = (start + max_fragment_bytes).min(bytes.len());
            let end = if target_end == bytes.len() {
                target_end
            } else {
                find_cut(bytes, start, target_end)
            };

            parts.push(bytes.slice(start..end));
            start = end;
        }

        Ok(Fragment::sequence(parts, format))
    }

    fn name(&self) -> &'static str {
        "line"
    }
}

/// Cut position in `start + 1..=target_end`
fn find_cut(data: &[u8], start: usize, target_end: usize) -> usize {
    if let Some(newline) = data[start..target_end].iter().rposition(|&b| b == b'\n') {
        return start + newline + 1;
    }

    let mut end = target_end;
    while end > start && is_continuation_byte(data[end]) {
        end -= 1;
    }

    // A single character wider than the limit
    if end == start {
        target_end
    } else {
        end
    }
}

fn is_continuation_byte(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::has_contiguous_ordinals;

    fn split(text: &str, limit: usize) -> Vec<Fragment> {
        LineSplitter::new()
            .split(&Bytes::from(text.to_string()), &DocumentFormat::Txt, limit)
            .unwrap()
    }

    fn rejoin(fragments: &[Fragment]) -> Vec<u8> {
        fragments
            .iter()
            .flat_map(|f| f.bytes().iter().copied())
            .collect()
    }

    #[test]
    fn test_supported_formats() {
        let splitter = LineSplitter::new();

        assert!(splitter.supports(&DocumentFormat::Txt));
        assert!(splitter.supports(&DocumentFormat::Md));
        assert!(splitter.supports(&DocumentFormat::Csv));
        assert!(splitter.supports(&DocumentFormat::Html));
        assert!(!splitter.supports(&DocumentFormat::Pdf));
        assert!(!splitter.supports(&DocumentFormat::Docx));
    }

    #[test]
    fn test_empty_input() {
        assert!(split("", 10).is_empty());
    }

    #[test]
    fn test_small_input_is_one_fragment() {
        let fragments = split("hello\nworld\n", 100);

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].ordinal(), 1);
        assert_eq!(&fragments[0].bytes()[..], b"hello\nworld\n");
    }

    #[test]
    fn test_cuts_on_line_boundaries() {
        let text = "alpha\nbravo\ncharlie\ndelta\necho\n";
        let fragments = split(text, 14);

        assert!(fragments.len() > 1);
        assert!(has_contiguous_ordinals(&fragments));
        for fragment in &fragments[..fragments.len() - 1] {
            assert!(fragment.bytes().ends_with(b"\n"));
            assert!(fragment.len() <= 14);
        }
        assert_eq!(rejoin(&fragments), text.as_bytes());
    }

    #[test]
    fn test_long_line_falls_back_to_char_boundaries() {
        let text = "ñandú".repeat(20);
        let fragments = split(&text, 7);

        assert!(fragments.len() > 1);
        for fragment in &fragments {
            assert!(fragment.len() <= 7);
            assert!(std::str::from_utf8(fragment.bytes()).is_ok());
        }
        assert_eq!(rejoin(&fragments), text.as_bytes());
    }

    #[test]
    fn test_round_trip_covers_input_exactly() {
        let text: String = (0..500)
            .map(|i| format!("row {},value {},€\n", i, i * 7))
            .collect();
        let fragments = split(&text, 256);

        assert!(has_contiguous_ordinals(&fragments));
        assert!(fragments.iter().all(|f| f.len() <= 256 && !f.is_empty()));
        assert_eq!(rejoin(&fragments), text.as_bytes());
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let result = LineSplitter::new().split(&Bytes::from_static(b"x"), &DocumentFormat::Txt, 0);
        assert!(matches!(result, Err(SplitError::InvalidLimit(_))));
    }

    #[test]
    fn test_unsupported_format_is_rejected() {
        let result =
            LineSplitter::new().split(&Bytes::from_static(b"x"), &DocumentFormat::Pdf, 10);
        assert!(matches!(result, Err(SplitError::Unsupported(DocumentFormat::Pdf))));
    }
}
