//! Flattened per-cell export records.
//!
//! The unified projection turns a sheet's cell map into a row-major list of
//! `{row, col, type, value, style?, meta?}` records for format writers. It
//! only goes one way; nothing reads it back into a document.

use serde::{Deserialize, Serialize};

use cellvault_types::{
    CellData, CellRef, CellStyle, CellType, CellValue, DocumentState, MergeSpan, Sheet, SheetId,
};

fn is_false(b: &bool) -> bool {
    !*b
}

/// Value type as seen by export consumers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnifiedType {
    String,
    Number,
    Boolean,
    Empty,
    Formula,
    Date,
    Currency,
    Percentage,
    Error,
}

impl From<CellType> for UnifiedType {
    fn from(t: CellType) -> Self {
        match t {
            CellType::Text => UnifiedType::String,
            CellType::Number => UnifiedType::Number,
            CellType::Boolean => UnifiedType::Boolean,
            CellType::Date => UnifiedType::Date,
            CellType::Currency => UnifiedType::Currency,
            CellType::Percentage => UnifiedType::Percentage,
            CellType::Formula => UnifiedType::Formula,
            CellType::Error => UnifiedType::Error,
        }
    }
}

impl UnifiedType {
    /// Formula beats an explicit tag, which beats the value's own shape.
    pub fn of(cell: &CellData) -> Self {
        if cell.has_formula() {
            return UnifiedType::Formula;
        }
        if let Some(t) = cell.cell_type {
            return t.into();
        }
        match cell.value {
            CellValue::Text(_) => UnifiedType::String,
            CellValue::Number(_) => UnifiedType::Number,
            CellValue::Boolean(_) => UnifiedType::Boolean,
            CellValue::Null => UnifiedType::Empty,
        }
    }
}

/// Non-visual cell attributes carried along in an export.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_span: Option<MergeSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_with: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

impl UnifiedMeta {
    pub fn is_empty(&self) -> bool {
        *self == UnifiedMeta::default()
    }
}

/// One populated cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnifiedCell {
    /// 1-based.
    pub row: u32,
    /// Column letters (`"A"`, `"AB"`).
    pub col: String,
    #[serde(rename = "type")]
    pub kind: UnifiedType,
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<UnifiedMeta>,
}

/// Projection of one sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedSheet {
    pub sheet_id: SheetId,
    pub name: String,
    pub cells: Vec<UnifiedCell>,
}

/// Project every populated cell of `sheet`, ordered by row then column.
pub fn project_sheet(sheet: &Sheet) -> Vec<UnifiedCell> {
    let mut cells: Vec<(CellRef, &str, &CellData)> = sheet
        .cells
        .iter()
        .filter_map(|(key, cell)| CellRef::parse(key).map(|r| (r, key.as_str(), cell)))
        .collect();
    cells.sort_by_key(|(r, _, _)| (r.row, r.col));

    cells
        .into_iter()
        .map(|(at, key, cell)| {
            let meta = UnifiedMeta {
                formula: cell.formula.clone().filter(|f| !f.is_empty()),
                comment: cell.comment.clone(),
                hyperlink: cell.hyperlink.clone(),
                merge_span: cell.merge_span.filter(|_| cell.is_merge_parent),
                merged_with: cell.merged_with.clone(),
                locked: cell.locked || sheet.is_cell_locked(key),
                hidden: cell.hidden,
            };
            UnifiedCell {
                row: at.row,
                col: at.column_letters(),
                kind: UnifiedType::of(cell),
                value: cell.value.clone(),
                style: cell.style.clone().filter(|s| !s.is_empty()),
                meta: (!meta.is_empty()).then_some(meta),
            }
        })
        .collect()
}

/// Project every sheet of `doc` in display order.
pub fn project_document(doc: &DocumentState) -> Vec<UnifiedSheet> {
    doc.sheets
        .iter()
        .map(|sheet| UnifiedSheet {
            sheet_id: sheet.sheet_id.clone(),
            name: sheet.name.clone(),
            cells: project_sheet(sheet),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sheet() -> Sheet {
        let mut sheet = Sheet::new("s", "S");
        sheet.cells.insert("B2".into(), CellData::with_value(2.0));
        sheet.cells.insert("AA1".into(), CellData::with_value("wide"));
        sheet.cells.insert(
            "A2".into(),
            CellData {
                value: CellValue::Number(3.0),
                formula: Some("=1+2".into()),
                ..Default::default()
            },
        );
        sheet.cells.insert("C1".into(), CellData::with_value(true));
        sheet
    }

    #[test]
    fn test_row_major_order() {
        let cells = project_sheet(&sheet());
        let coords: Vec<(u32, &str)> = cells.iter().map(|c| (c.row, c.col.as_str())).collect();
        assert_eq!(coords, vec![(1, "C"), (1, "AA"), (2, "A"), (2, "B")]);
    }

    #[test]
    fn test_type_derivation() {
        let cells = project_sheet(&sheet());
        let kinds: Vec<UnifiedType> = cells.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![UnifiedType::Boolean, UnifiedType::String, UnifiedType::Formula, UnifiedType::Number]
        );

        let tagged = CellData {
            value: CellValue::Number(0.25),
            cell_type: Some(CellType::Percentage),
            ..Default::default()
        };
        assert_eq!(UnifiedType::of(&tagged), UnifiedType::Percentage);
        assert_eq!(UnifiedType::of(&CellData::default()), UnifiedType::Empty);
    }

    #[test]
    fn test_meta_only_when_set() {
        let mut s = sheet();
        s.cell_locks.insert("B2".into(), true);
        let cells = project_sheet(&s);
        let formula_cell = &cells[2];
        assert_eq!(formula_cell.meta.as_ref().unwrap().formula.as_deref(), Some("=1+2"));
        assert!(cells[0].meta.is_none());
        assert!(cells[3].meta.as_ref().unwrap().locked);

        let v = serde_json::to_value(&cells[0]).unwrap();
        assert_eq!(v, json!({"row": 1, "col": "C", "type": "boolean", "value": true}));
    }

    #[test]
    fn test_project_document_keeps_sheet_order() {
        let mut doc = DocumentState::new("t", "o", 0);
        doc.sheets.push(Sheet::new("second", "Second"));
        doc.metadata.sheet_count = 2;
        let sheets = project_document(&doc);
        let ids: Vec<&str> = sheets.iter().map(|s| s.sheet_id.as_str()).collect();
        assert_eq!(ids, vec!["sheet-1", "second"]);
    }
}
