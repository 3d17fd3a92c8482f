//! PDF splitting by page ranges

use std::collections::HashSet;

use bytes::Bytes;
use lopdf::Document;
use tracing::{debug, warn};

use crate::domain::document::{DocumentFormat, Fragment};
use crate::domain::splitting::{soft_target, validate_limit, FragmentSplitter, SplitError};

/// Splits a PDF into smaller, independently valid PDFs made of whole pages.
///
/// Batch sizes start from the average page weight and adapt to the size of
/// each encoded batch: shrink by 0.7 when over the limit, grow by 1.5 when
/// under half the soft target, shrink by 0.9 when above 95% of it.
#[derive(Debug, Clone, Default)]
pub struct PdfSplitter;

impl PdfSplitter {
    pub fn new() -> Self {
        Self
    }
}

impl FragmentSplitter for PdfSplitter {
    fn supports(&self, format: &DocumentFormat) -> bool {
        *format == DocumentFormat::Pdf
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

        if bytes.len() < max_fragment_bytes {
            return Ok(vec![Fragment::whole(bytes.clone(), format)]);
        }

        let source = Document::load_mem(bytes)
            .map_err(|e| SplitError::corrupt(DocumentFormat::Pdf, e.to_string()))?;
        let pages: Vec<u32> = source.get_pages().keys().copied().collect();

        if pages.is_empty() {
            return Ok(vec![]);
        }

        let soft = soft_target(max_fragment_bytes);
        let average_page = bytes.len() as f64 / pages.len() as f64;
        let mut batch = ((soft as f64 / average_page) as usize).max(1);
        let mut parts = Vec::new();
        let mut current = 0;

        while current < pages.len() {
            loop {
                let end = (current + batch).min(pages.len());
                let encoded = extract_pages(&source, &pages, &pages[current..end])?;
                let size = encoded.len();

                if size <= max_fragment_bytes || batch == 1 {
                    if size > max_fragment_bytes {
                        warn!(
                            page = pages[current],
                            size,
                            max_fragment_bytes,
                            "Single page exceeds the fragment limit"
                        );
                    }

                    debug!(
                        first_page = pages[current],
                        pages = end - current,
                        size,
                        "PDF fragment encoded"
                    );
                    parts.push(encoded);
                    current = end;

                    if (size as f64) < soft as f64 * 0.5 {
                        batch = (batch * 3 / 2).max(batch + 1);
                    } else if (size as f64) > soft as f64 * 0.95 {
                        batch = ((batch as f64 * 0.9) as usize).max(1);
                    }
                    break;
                }

                let shrunk = (batch as f64 * 0.7) as usize;
                batch = shrunk.min(batch - 1).max(1);
            }
        }

        Ok(Fragment::sequence(parts, format))
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}

/// Encode a copy of `source` holding only the `keep` pages
fn extract_pages(source: &Document, all: &[u32], keep: &[u32]) -> Result<Vec<u8>, SplitError> {
    let keep: HashSet<u32> = keep.iter().copied().collect();
    let dropped: Vec<u32> = all.iter().copied().filter(|p| !keep.contains(p)).collect();

    let mut document = source.clone();
    document.delete_pages(&dropped);
    document.prune_objects();
    document.compress();

    let mut buffer = Vec::new();
    document
        .save_to(&mut buffer)
        .map_err(|e| SplitError::encode(DocumentFormat::Pdf, e.to_string()))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::has_contiguous_ordinals;
    use lopdf::{dictionary, Object, Stream};

    /// Bytes that deflate cannot shrink
    fn noise(len: usize, seed: u64) -> Vec<u8> {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (state >> 33) as u8
            })
            .collect()
    }

    /// A PDF whose pages each carry `padding` incompressible bytes
    fn build_pdf(pages: usize, padding: usize) -> Bytes {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for i in 0..pages {
            let text = format!("BT /F1 24 Tf 72 720 Td (Page {}) Tj ET", i + 1);
            let content_id = doc.add_object(Stream::new(dictionary! {}, text.into_bytes()));
            let padding_id = doc.add_object(
                Stream::new(dictionary! {}, noise(padding, i as u64)).with_compression(false),
            );
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "PieceInfo" => padding_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        Bytes::from(buffer)
    }

    fn page_count(fragment: &Fragment) -> usize {
        Document::load_mem(fragment.bytes()).unwrap().get_pages().len()
    }

    #[test]
    fn test_small_pdf_is_returned_whole() {
        let pdf = build_pdf(2, 100);
        let fragments = PdfSplitter::new()
            .split(&pdf, &DocumentFormat::Pdf, pdf.len() + 1)
            .unwrap();

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].bytes(), &pdf);
    }

    #[test]
    fn test_splits_into_valid_page_ranges() {
        let pdf = build_pdf(6, 30_000);
        let limit = 70_000;
        let fragments = PdfSplitter::new()
            .split(&pdf, &DocumentFormat::Pdf, limit)
            .unwrap();

        assert!(fragments.len() >= 3);
        assert!(has_contiguous_ordinals(&fragments));
        assert!(fragments.iter().all(|f| f.len() <= limit));
        assert!(fragments.iter().all(|f| f.format() == &DocumentFormat::Pdf));

        let total_pages: usize = fragments.iter().map(page_count).sum();
        assert_eq!(total_pages, 6);
    }

    #[test]
    fn test_oversized_page_is_emitted_alone() {
        let pdf = build_pdf(3, 30_000);
        let fragments = PdfSplitter::new()
            .split(&pdf, &DocumentFormat::Pdf, 20_000)
            .unwrap();

        assert_eq!(fragments.len(), 3);
        assert!(fragments.iter().all(|f| page_count(f) == 1));
    }

    #[test]
    fn test_corrupt_pdf_over_the_limit() {
        let garbage = Bytes::from(noise(5_000, 7));
        let result = PdfSplitter::new().split(&garbage, &DocumentFormat::Pdf, 1_000);

        assert!(matches!(result, Err(SplitError::Corrupt { .. })));
    }

    #[test]
    fn test_supports_only_pdf() {
        let splitter = PdfSplitter::new();

        assert!(splitter.supports(&DocumentFormat::Pdf));
        assert!(!splitter.supports(&DocumentFormat::Xlsx));
    }
}
