//! Structural checks for documents arriving from untrusted sources.
//!
//! The reducer keeps these invariants for documents it builds itself; bytes
//! fetched from content storage get checked here before they replace state.

use std::collections::HashSet;

use thiserror::Error;

use crate::cell_ref::{CellRange, CellRef};
use crate::document::DocumentState;
use crate::objects::SheetObject;
use crate::sheet::Sheet;

/// Why a document failed ingestion.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("sheet count {declared} does not match {actual} sheets")]
    SheetCountMismatch { declared: usize, actual: usize },

    #[error("duplicate sheet id: {0}")]
    DuplicateSheet(String),

    #[error("active sheet {0:?} does not exist")]
    DanglingActiveSheet(String),

    #[error("sheet {sheet}: invalid cell key {key:?}")]
    InvalidCellKey { sheet: String, key: String },

    #[error("sheet {sheet}: {what} {key} outside the {rows}x{cols} grid")]
    OutOfBounds {
        sheet: String,
        what: &'static str,
        key: String,
        rows: u32,
        cols: u32,
    },

    #[error("sheet {sheet}: merge error at {key}: {reason}")]
    Merge {
        sheet: String,
        key: String,
        reason: &'static str,
    },

    #[error("sheet {sheet}: non-finite number at {location}")]
    NonFinite { sheet: String, location: String },

    #[error("sheet {sheet}: duplicate {kind} id {id}")]
    DuplicateObject {
        sheet: String,
        kind: &'static str,
        id: String,
    },
}

/// Check every document-level and sheet-level invariant.
pub fn validate_document(doc: &DocumentState) -> Result<(), ValidationError> {
    if doc.metadata.sheet_count != doc.sheets.len() {
        return Err(ValidationError::SheetCountMismatch {
            declared: doc.metadata.sheet_count,
            actual: doc.sheets.len(),
        });
    }

    let mut seen = HashSet::new();
    for sheet in &doc.sheets {
        if !seen.insert(sheet.sheet_id.as_str()) {
            return Err(ValidationError::DuplicateSheet(sheet.sheet_id.clone()));
        }
    }

    let active_ok = if doc.sheets.is_empty() {
        doc.active_sheet_id.is_empty()
    } else {
        seen.contains(doc.active_sheet_id.as_str())
    };
    if !active_ok {
        return Err(ValidationError::DanglingActiveSheet(doc.active_sheet_id.clone()));
    }

    for sheet in &doc.sheets {
        validate_sheet(sheet)?;
    }
    Ok(())
}

/// Check keys, indices, merges, numbers and object ids of one sheet.
pub fn validate_sheet(sheet: &Sheet) -> Result<(), ValidationError> {
    let grid = &sheet.grid;
    let out_of_bounds = |what: &'static str, key: String| ValidationError::OutOfBounds {
        sheet: sheet.sheet_id.clone(),
        what,
        key,
        rows: grid.row_count,
        cols: grid.column_count,
    };
    let parse_in_bounds = |what: &'static str, key: &str| -> Result<CellRef, ValidationError> {
        let cell = CellRef::parse(key).ok_or_else(|| ValidationError::InvalidCellKey {
            sheet: sheet.sheet_id.clone(),
            key: key.to_string(),
        })?;
        if !grid.contains(&cell) {
            return Err(out_of_bounds(what, key.to_string()));
        }
        Ok(cell)
    };

    for key in sheet.cells.keys() {
        parse_in_bounds("cell", key)?;
    }
    for key in sheet.cell_locks.keys() {
        parse_in_bounds("lock", key)?;
    }
    for (row, size) in &grid.row_sizes {
        if *row >= grid.row_count {
            return Err(out_of_bounds("row size", row.to_string()));
        }
        check_finite(sheet, *size, || format!("rowSizes[{row}]"))?;
    }
    for (col, size) in &grid.column_sizes {
        if *col >= grid.column_count {
            return Err(out_of_bounds("column size", col.to_string()));
        }
        check_finite(sheet, *size, || format!("columnSizes[{col}]"))?;
    }
    if let Some(row) = grid.hidden_rows.iter().find(|r| **r >= grid.row_count) {
        return Err(out_of_bounds("hidden row", row.to_string()));
    }
    if let Some(col) = grid.hidden_columns.iter().find(|c| **c >= grid.column_count) {
        return Err(out_of_bounds("hidden column", col.to_string()));
    }

    for (key, cell) in &sheet.cells {
        if let crate::cell::CellValue::Number(n) = cell.value {
            check_finite(sheet, n, || key.clone())?;
        }
    }

    validate_merges(sheet)?;

    check_unique_ids(sheet, "image", &sheet.images)?;
    check_unique_ids(sheet, "shape", &sheet.shapes)?;
    check_unique_ids(sheet, "chart", &sheet.charts)?;
    check_unique_ids(sheet, "link", &sheet.links)?;
    check_unique_ids(sheet, "symbol", &sheet.symbols)?;
    check_unique_ids(sheet, "conditional format", &sheet.conditional_formats)?;
    Ok(())
}

fn validate_merges(sheet: &Sheet) -> Result<(), ValidationError> {
    let merge_err = |key: &str, reason: &'static str| ValidationError::Merge {
        sheet: sheet.sheet_id.clone(),
        key: key.to_string(),
        reason,
    };

    let mut regions: Vec<(&str, CellRange)> = Vec::new();
    for (key, cell) in &sheet.cells {
        if cell.is_merge_parent {
            if cell.merged_with.is_some() {
                return Err(merge_err(key, "merge parent also points to another parent"));
            }
            let span = cell.merge_span.ok_or_else(|| merge_err(key, "merge parent without span"))?;
            if span.rows == 0 || span.cols == 0 {
                return Err(merge_err(key, "empty merge span"));
            }
            // Keys were already checked by validate_sheet.
            let Some(origin) = CellRef::parse(key) else {
                return Err(merge_err(key, "unparseable merge parent key"));
            };
            let Some(region) = CellRange::from_span(origin, span.rows, span.cols)
                .filter(|region| sheet.grid.contains(&region.end))
            else {
                return Err(merge_err(key, "merge region leaves the grid"));
            };
            if regions.iter().any(|(_, other)| other.overlaps(&region)) {
                return Err(merge_err(key, "overlapping merge regions"));
            }
            regions.push((key.as_str(), region));
        }
    }

    for (key, cell) in &sheet.cells {
        let Some(parent_key) = cell.merged_with.as_deref() else {
            continue;
        };
        let Some((_, region)) = regions.iter().find(|(k, _)| *k == parent_key) else {
            return Err(merge_err(key, "mergedWith does not name a merge parent"));
        };
        let inside = CellRef::parse(key).is_some_and(|c| region.contains(&c));
        if !inside {
            return Err(merge_err(key, "cell lies outside its parent's region"));
        }
    }
    Ok(())
}

fn check_finite(
    sheet: &Sheet,
    value: f64,
    location: impl FnOnce() -> String,
) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite {
            sheet: sheet.sheet_id.clone(),
            location: location(),
        })
    }
}

fn check_unique_ids<T: SheetObject>(
    sheet: &Sheet,
    kind: &'static str,
    items: &[T],
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.id()) {
            return Err(ValidationError::DuplicateObject {
                sheet: sheet.sheet_id.clone(),
                kind,
                id: item.id().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellData, MergeSpan};
    use crate::objects::{ImageObject, Placement};

    fn doc() -> DocumentState {
        DocumentState::new("t", "o", 0)
    }

    fn merged_doc() -> DocumentState {
        let mut d = doc();
        let sheet = &mut d.sheets[0];
        sheet.cells.insert(
            "A1".into(),
            CellData {
                is_merge_parent: true,
                merge_span: Some(MergeSpan { rows: 2, cols: 2 }),
                ..Default::default()
            },
        );
        for key in ["B1", "A2", "B2"] {
            sheet.cells.insert(
                key.into(),
                CellData {
                    merged_with: Some("A1".into()),
                    ..Default::default()
                },
            );
        }
        d
    }

    #[test]
    fn test_fresh_document_is_valid() {
        assert_eq!(validate_document(&doc()), Ok(()));
        assert_eq!(validate_document(&merged_doc()), Ok(()));
    }

    #[test]
    fn test_sheet_count_mismatch() {
        let mut d = doc();
        d.metadata.sheet_count = 2;
        assert!(matches!(
            validate_document(&d),
            Err(ValidationError::SheetCountMismatch { declared: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_dangling_active_sheet() {
        let mut d = doc();
        d.active_sheet_id = "nope".into();
        assert!(matches!(validate_document(&d), Err(ValidationError::DanglingActiveSheet(_))));

        let mut empty = doc();
        empty.sheets.clear();
        empty.metadata.sheet_count = 0;
        assert!(validate_document(&empty).is_err());
        empty.active_sheet_id.clear();
        assert_eq!(validate_document(&empty), Ok(()));
    }

    #[test]
    fn test_out_of_bounds_cell() {
        let mut d = doc();
        d.sheets[0].cells.insert("A101".into(), CellData::default());
        assert!(matches!(validate_document(&d), Err(ValidationError::OutOfBounds { .. })));
    }

    #[test]
    fn test_invalid_key() {
        let mut d = doc();
        d.sheets[0].cell_locks.insert("hello".into(), true);
        assert!(matches!(validate_document(&d), Err(ValidationError::InvalidCellKey { .. })));
    }

    #[test]
    fn test_row_size_out_of_bounds() {
        let mut d = doc();
        d.sheets[0].grid.row_sizes.insert(100, 20.0);
        assert!(matches!(validate_document(&d), Err(ValidationError::OutOfBounds { .. })));
    }

    #[test]
    fn test_parent_without_span() {
        let mut d = merged_doc();
        d.sheets[0].cells.get_mut("A1").unwrap().merge_span = None;
        assert!(matches!(validate_document(&d), Err(ValidationError::Merge { .. })));
    }

    #[test]
    fn test_overlapping_merges() {
        let mut d = merged_doc();
        d.sheets[0].cells.insert(
            "B2".into(),
            CellData {
                is_merge_parent: true,
                merge_span: Some(MergeSpan { rows: 2, cols: 2 }),
                ..Default::default()
            },
        );
        assert!(matches!(validate_document(&d), Err(ValidationError::Merge { .. })));
    }

    #[test]
    fn test_huge_merge_span_is_rejected() {
        let mut d = doc();
        d.sheets[0].cells.insert(
            "B2".into(),
            CellData {
                is_merge_parent: true,
                merge_span: Some(MergeSpan { rows: u32::MAX, cols: 1 }),
                ..Default::default()
            },
        );
        assert!(matches!(
            validate_document(&d),
            Err(ValidationError::Merge { ref reason, .. }) if reason.contains("leaves the grid")
        ));
    }

    #[test]
    fn test_child_outside_parent_region() {
        let mut d = merged_doc();
        d.sheets[0].cells.insert(
            "C3".into(),
            CellData {
                merged_with: Some("A1".into()),
                ..Default::default()
            },
        );
        assert!(matches!(validate_document(&d), Err(ValidationError::Merge { .. })));
    }

    #[test]
    fn test_non_finite_number() {
        let mut d = doc();
        d.sheets[0].cells.insert("A1".into(), CellData::with_value(f64::NAN));
        assert!(matches!(validate_document(&d), Err(ValidationError::NonFinite { .. })));
    }

    #[test]
    fn test_duplicate_object_ids() {
        let mut d = doc();
        let img = ImageObject::new("img-1", "src", Placement::default());
        d.sheets[0].images = vec![img.clone(), img];
        assert!(matches!(validate_document(&d), Err(ValidationError::DuplicateObject { .. })));
    }
}
