//! XLSX splitting by whole sheets

use std::io::Cursor;

use bytes::Bytes;
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Workbook, XlsxError};
use tracing::{debug, warn};

use crate::domain::document::{DocumentFormat, Fragment};
use crate::domain::splitting::{soft_target, validate_limit, FragmentSplitter, SplitError};

type Sheet = (String, Range<Data>);

/// Groups whole sheets into new workbooks under the soft size target.
///
/// Only cell values are carried over; styles, formulas and charts are not.
#[derive(Debug, Clone, Default)]
pub struct XlsxSplitter;

impl XlsxSplitter {
    pub fn new() -> Self {
        Self
    }
}

impl FragmentSplitter for XlsxSplitter {
    fn supports(&self, format: &DocumentFormat) -> bool {
        *format == DocumentFormat::Xlsx
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

        // Opened before the fast path so corrupt input fails at any size
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.clone()))
            .map_err(|e| SplitError::corrupt(DocumentFormat::Xlsx, e.to_string()))?;
        let names = workbook.sheet_names().to_vec();

        if names.is_empty() {
            return Ok(vec![]);
        }

        if bytes.len() < max_fragment_bytes {
            return Ok(vec![Fragment::whole(bytes.clone(), format)]);
        }

        let mut sheets: Vec<Sheet> = Vec::with_capacity(names.len());
        for name in names {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| SplitError::corrupt(DocumentFormat::Xlsx, e.to_string()))?;
            sheets.push((name, range));
        }

        let soft = soft_target(max_fragment_bytes);
        let mut parts = Vec::new();
        let mut group: Vec<&Sheet> = Vec::new();
        let mut estimate = 0;

        for sheet in &sheets {
            let size = encode_sheets(&[sheet])?.len();

            if estimate + size > soft && !group.is_empty() {
                parts.push(encode_group(&group, max_fragment_bytes)?);
                group.clear();
                estimate = 0;
            }

            group.push(sheet);
            estimate += size;
        }

        if !group.is_empty() {
            parts.push(encode_group(&group, max_fragment_bytes)?);
        }

        Ok(Fragment::sequence(parts, format))
    }

    fn name(&self) -> &'static str {
        "xlsx"
    }
}

fn encode_group(group: &[&Sheet], max_fragment_bytes: usize) -> Result<Vec<u8>, SplitError> {
    let encoded = encode_sheets(group)?;
    let names: Vec<&str> = group.iter().map(|(name, _)| name.as_str()).collect();

    if encoded.len() > max_fragment_bytes {
        warn!(
            sheets = ?names,
            size = encoded.len(),
            max_fragment_bytes,
            "Sheet exceeds the fragment limit on its own"
        );
    }

    debug!(sheets = ?names, size = encoded.len(), "XLSX fragment encoded");
    Ok(encoded)
}

/// Write the sheets' cell values into a fresh workbook
fn encode_sheets(sheets: &[&Sheet]) -> Result<Vec<u8>, SplitError> {
    let mut workbook = Workbook::new();

    for (name, range) in sheets.iter().copied() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name).map_err(encode_error)?;

        let (first_row, first_col) = range.start().unwrap_or((0, 0));

        for (r, c, cell) in range.used_cells() {
            let row = first_row + r as u32;
            let col = (first_col + c as u32) as u16;

            match cell {
                Data::Int(value) => worksheet.write_number(row, col, *value as f64),
                Data::Float(value) => worksheet.write_number(row, col, *value),
                Data::Bool(value) => worksheet.write_boolean(row, col, *value),
                Data::String(value) => worksheet.write_string(row, col, value),
                Data::DateTime(value) => worksheet.write_number(row, col, value.as_f64()),
                Data::DateTimeIso(value) | Data::DurationIso(value) => {
                    worksheet.write_string(row, col, value)
                }
                Data::Error(error) => worksheet.write_string(row, col, error.to_string()),
                Data::Empty => continue,
            }
            .map_err(encode_error)?;
        }
    }

    workbook.save_to_buffer().map_err(encode_error)
}

fn encode_error(e: XlsxError) -> SplitError {
    SplitError::encode(DocumentFormat::Xlsx, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::has_contiguous_ordinals;

    fn noise_text(seed: u64) -> String {
        let mut state = seed;
        (0..4)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                format!("{:08x}", state >> 32)
            })
            .collect()
    }

    fn build_workbook(sheets: &[&str], rows: u32) -> Bytes {
        let mut workbook = Workbook::new();

        for (s, name) in sheets.iter().enumerate() {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(*name).unwrap();
            worksheet.write_string(0, 0, "label").unwrap();
            worksheet.write_string(0, 1, "amount").unwrap();

            for row in 1..=rows {
                let seed = (s as u64) << 32 | row as u64;
                worksheet.write_string(row, 0, noise_text(seed)).unwrap();
                worksheet.write_number(row, 1, row as f64 * 1.5).unwrap();
            }
        }

        Bytes::from(workbook.save_to_buffer().unwrap())
    }

    fn sheet_names(fragment: &Fragment) -> Vec<String> {
        let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(fragment.bytes().clone())).unwrap();
        workbook.sheet_names().to_vec()
    }

    #[test]
    fn test_small_workbook_is_returned_whole() {
        let xlsx = build_workbook(&["Summary"], 10);
        let fragments = XlsxSplitter::new()
            .split(&xlsx, &DocumentFormat::Xlsx, xlsx.len() + 1)
            .unwrap();

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].bytes(), &xlsx);
    }

    #[test]
    fn test_corrupt_workbook_fails_even_when_small() {
        let garbage = Bytes::from_static(b"definitely not a zip archive");
        let result = XlsxSplitter::new().split(&garbage, &DocumentFormat::Xlsx, 1_000_000);

        assert!(matches!(result, Err(SplitError::Corrupt { .. })));
    }

    #[test]
    fn test_groups_whole_sheets_in_order() {
        let names = ["North", "South", "East", "West"];
        let xlsx = build_workbook(&names, 1_500);
        let limit = xlsx.len() / 2;

        let fragments = XlsxSplitter::new()
            .split(&xlsx, &DocumentFormat::Xlsx, limit)
            .unwrap();

        assert!(fragments.len() >= 2);
        assert!(has_contiguous_ordinals(&fragments));

        let all: Vec<String> = fragments.iter().flat_map(sheet_names).collect();
        assert_eq!(all, names.iter().map(|n| n.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn test_cell_values_survive() {
        let xlsx = build_workbook(&["North", "South"], 1_500);
        let fragments = XlsxSplitter::new()
            .split(&xlsx, &DocumentFormat::Xlsx, xlsx.len() / 2)
            .unwrap();

        let mut workbook: Xlsx<_> =
            open_workbook_from_rs(Cursor::new(fragments[0].bytes().clone())).unwrap();
        let range = workbook.worksheet_range("North").unwrap();

        assert_eq!(range.get_value((0, 1)), Some(&Data::String("amount".to_string())));
        assert_eq!(range.get_value((2, 1)), Some(&Data::Float(3.0)));
        assert_eq!(
            range.get_value((1, 0)),
            Some(&Data::String(noise_text(1)))
        );
    }

    #[test]
    fn test_supports_only_xlsx() {
        let splitter = XlsxSplitter::new();

        assert!(splitter.supports(&DocumentFormat::Xlsx));
        assert!(!splitter.supports(&DocumentFormat::Xls));
        assert!(!splitter.supports(&DocumentFormat::Csv));
    }
}
