//! Inbound side of live-editing sync.
//!
//! Interactive grid components speak in 0-based `(row, col)` coordinates and
//! loose JSON values. [`apply_live_edits`] folds a batch of those edits into
//! a single `UPDATE_CELLS` action so the batch lands atomically.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cellvault_types::{CellKey, CellRef, CellStyle, CellValue, cell_ref::MAX_COLUMN_INDEX};

use crate::action::CellPatch;
use crate::editor::DocumentEditor;

/// One cell edit as produced by a live grid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveCellEdit {
    /// 0-based.
    pub row: u32,
    /// 0-based.
    pub col: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// An empty string clears the formula.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,
}

impl LiveCellEdit {
    pub fn new(row: u32, col: u32, value: serde_json::Value) -> Self {
        Self {
            row,
            col,
            value: Some(value),
            ..Default::default()
        }
    }

    /// A1 key for this edit, or `None` when the coordinate is off the grid.
    pub fn cell_key(&self) -> Option<CellKey> {
        if self.col > MAX_COLUMN_INDEX {
            return None;
        }
        let row = self.row.checked_add(1)?;
        Some(CellRef::new(row, self.col).key())
    }

    fn fold_into(self, patch: &mut CellPatch) {
        if let Some(value) = self.value {
            patch.value = Some(coerce_value(value));
        }
        if let Some(formula) = self.formula {
            patch.formula = Some((!formula.is_empty()).then_some(formula));
        }
        if let Some(style) = self.style {
            let style = match &patch.style {
                Some(Some(earlier)) => earlier.merged(&style),
                _ => style,
            };
            patch.style = Some(Some(style));
        }
    }
}

/// Map a JSON value onto a cell value. Objects and arrays are kept as their
/// JSON text.
pub fn coerce_value(value: serde_json::Value) -> CellValue {
    match value {
        serde_json::Value::Null => CellValue::Null,
        serde_json::Value::Bool(b) => CellValue::Boolean(b),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(CellValue::Number)
            .unwrap_or_else(|| CellValue::Text(n.to_string())),
        serde_json::Value::String(s) => CellValue::Text(s),
        other => CellValue::Text(other.to_string()),
    }
}

/// Apply a batch of live edits as one `UPDATE_CELLS` action.
///
/// Edits to the same cell are folded in order, later fields winning.
/// Off-grid coordinates are dropped. Returns whether the document changed;
/// an empty batch dispatches nothing.
pub fn apply_live_edits<E>(editor: &E, sheet_id: &str, edits: Vec<LiveCellEdit>) -> bool
where
    E: DocumentEditor + ?Sized,
{
    let mut updates: BTreeMap<CellKey, CellPatch> = BTreeMap::new();
    for edit in edits {
        let Some(key) = edit.cell_key() else {
            tracing::debug!(row = edit.row, col = edit.col, "live edit off the grid, dropped");
            continue;
        };
        edit.fold_into(updates.entry(key).or_default());
    }
    updates.retain(|_, patch| !patch.is_empty());
    if updates.is_empty() {
        return false;
    }
    editor.update_cells(sheet_id, updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::DetachedEditor;
    use crate::store::DocumentStore;
    use cellvault_types::DocumentState;
    use serde_json::json;

    fn store() -> DocumentStore {
        DocumentStore::new(DocumentState::new("t", "amy", 0))
    }

    fn cell_value(store: &DocumentStore, key: &str) -> Option<CellValue> {
        store.read(|d| d.sheet("sheet-1").unwrap().cell(key).map(|c| c.value.clone()))
    }

    #[test]
    fn test_coordinates_are_zero_based() {
        assert_eq!(LiveCellEdit::new(0, 0, json!(1)).cell_key().as_deref(), Some("A1"));
        assert_eq!(LiveCellEdit::new(9, 27, json!(1)).cell_key().as_deref(), Some("AB10"));
        assert!(LiveCellEdit::new(0, MAX_COLUMN_INDEX + 1, json!(1)).cell_key().is_none());
    }

    #[test]
    fn test_coercion() {
        assert_eq!(coerce_value(json!(2.5)), CellValue::Number(2.5));
        assert_eq!(coerce_value(json!(true)), CellValue::Boolean(true));
        assert_eq!(coerce_value(json!(null)), CellValue::Null);
        assert_eq!(coerce_value(json!("hi")), CellValue::Text("hi".into()));
        assert_eq!(coerce_value(json!([1, 2])), CellValue::Text("[1,2]".into()));
        assert_eq!(coerce_value(json!({"a": 1})), CellValue::Text(r#"{"a":1}"#.into()));
    }

    #[test]
    fn test_batch_is_one_action() {
        let store = store();
        let edits = vec![
            LiveCellEdit::new(0, 0, json!(1)),
            LiveCellEdit::new(1, 0, json!("two")),
            LiveCellEdit {
                row: 2,
                col: 1,
                value: Some(json!(3)),
                formula: Some("=A1+2".into()),
                style: None,
            },
        ];
        assert!(apply_live_edits(&store, "sheet-1", edits));
        assert_eq!(store.revision(), 1);
        assert_eq!(cell_value(&store, "A1"), Some(CellValue::Number(1.0)));
        assert_eq!(cell_value(&store, "A2"), Some(CellValue::Text("two".into())));
        let formula = store.read(|d| d.sheet("sheet-1").unwrap().cell("B3").unwrap().formula.clone());
        assert_eq!(formula.as_deref(), Some("=A1+2"));
    }

    #[test]
    fn test_same_cell_folds_in_order() {
        let store = store();
        let edits = vec![
            LiveCellEdit::new(0, 0, json!("first")),
            LiveCellEdit::new(0, 0, json!("second")),
        ];
        assert!(apply_live_edits(&store, "sheet-1", edits));
        assert_eq!(cell_value(&store, "A1"), Some(CellValue::Text("second".into())));
    }

    #[test]
    fn test_same_cell_styles_accumulate() {
        let store = store();
        let styled = |style: CellStyle| LiveCellEdit {
            style: Some(style),
            ..Default::default()
        };
        let edits = vec![
            styled(CellStyle { bold: Some(true), ..Default::default() }),
            styled(CellStyle { italic: Some(true), ..Default::default() }),
            styled(CellStyle { bold: Some(false), font_size: Some(14.0), ..Default::default() }),
        ];
        assert!(apply_live_edits(&store, "sheet-1", edits));
        let style = store
            .read(|d| d.sheet("sheet-1").unwrap().cell("A1").unwrap().style.clone())
            .unwrap();
        assert_eq!(style.bold, Some(false));
        assert_eq!(style.italic, Some(true));
        assert_eq!(style.font_size, Some(14.0));
    }

    #[test]
    fn test_empty_formula_clears() {
        let store = store();
        apply_live_edits(
            &store,
            "sheet-1",
            vec![LiveCellEdit {
                formula: Some("=1".into()),
                value: Some(json!(1)),
                ..Default::default()
            }],
        );
        apply_live_edits(
            &store,
            "sheet-1",
            vec![LiveCellEdit {
                formula: Some(String::new()),
                ..Default::default()
            }],
        );
        let formula = store.read(|d| d.sheet("sheet-1").unwrap().cell("A1").unwrap().formula.clone());
        assert!(formula.is_none());
    }

    #[test]
    fn test_empty_batch_dispatches_nothing() {
        let store = store();
        let mut rx = store.subscribe();
        assert!(!apply_live_edits(&store, "sheet-1", Vec::new()));
        assert!(!apply_live_edits(&store, "sheet-1", vec![LiveCellEdit::default()]));
        assert!(rx.try_recv().is_err());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_detached_editor() {
        assert!(!apply_live_edits(&DetachedEditor, "sheet-1", vec![LiveCellEdit::new(0, 0, json!(1))]));
    }
}
