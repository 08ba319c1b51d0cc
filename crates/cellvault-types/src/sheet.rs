//! Sheets and their grid configuration.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cell::CellData;
use crate::cell_ref::CellRef;
use crate::format::ConditionalFormat;
use crate::ids::{CellKey, SheetId};
use crate::objects::{ChartObject, ImageObject, LinkObject, ShapeObject, SymbolObject};

/// Stored keys are canonical (`"B12"`); lookups accept any letter case.
fn stored_key(key: &str) -> Cow<'_, str> {
    match CellRef::parse(key) {
        Some(cell) => Cow::Owned(cell.key()),
        None => Cow::Borrowed(key),
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn default_true() -> bool {
    true
}

pub const DEFAULT_ROW_COUNT: u32 = 100;
pub const DEFAULT_COLUMN_COUNT: u32 = 26;
pub const DEFAULT_ROW_HEIGHT: f64 = 24.0;
pub const DEFAULT_COLUMN_WIDTH: f64 = 100.0;

/// Grid dimensions and per-row/column overrides.
///
/// Row and column indices in this struct are 0-based; cell keys elsewhere use
/// 1-based rows. Bounds are advisory: they describe the visible grid and may
/// be extended, but ingestion from untrusted sources checks keys against them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    pub row_count: u32,
    pub column_count: u32,
    #[serde(default = "default_row_height")]
    pub default_row_height: f64,
    #[serde(default = "default_column_width")]
    pub default_column_width: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub row_sizes: BTreeMap<u32, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub column_sizes: BTreeMap<u32, f64>,
    #[serde(default)]
    pub frozen_rows: u32,
    #[serde(default)]
    pub frozen_columns: u32,
    #[serde(default = "default_true")]
    pub show_gridlines: bool,
    #[serde(default = "default_true")]
    pub show_headers: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden_rows: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden_columns: Vec<u32>,
}

fn default_row_height() -> f64 {
    DEFAULT_ROW_HEIGHT
}

fn default_column_width() -> f64 {
    DEFAULT_COLUMN_WIDTH
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_count: DEFAULT_ROW_COUNT,
            column_count: DEFAULT_COLUMN_COUNT,
            default_row_height: DEFAULT_ROW_HEIGHT,
            default_column_width: DEFAULT_COLUMN_WIDTH,
            row_sizes: BTreeMap::new(),
            column_sizes: BTreeMap::new(),
            frozen_rows: 0,
            frozen_columns: 0,
            show_gridlines: true,
            show_headers: true,
            hidden_rows: Vec::new(),
            hidden_columns: Vec::new(),
        }
    }
}

impl GridConfig {
    /// Whether a cell coordinate lies inside the declared bounds.
    pub fn contains(&self, cell: &CellRef) -> bool {
        cell.row >= 1 && cell.row <= self.row_count && cell.col < self.column_count
    }

    /// Effective height of a 0-based row.
    pub fn row_height(&self, row: u32) -> f64 {
        self.row_sizes.get(&row).copied().unwrap_or(self.default_row_height)
    }

    /// Effective width of a 0-based column.
    pub fn column_width(&self, col: u32) -> f64 {
        self.column_sizes.get(&col).copied().unwrap_or(self.default_column_width)
    }
}

/// One tab of a document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub sheet_id: SheetId,
    pub name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub protected: bool,
    /// Hex digest of the protection password, never the plaintext.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection_password: Option<String>,
    /// Per-cell locks, independent of sheet-level protection.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cell_locks: BTreeMap<CellKey, bool>,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub cells: BTreeMap<CellKey, CellData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<ShapeObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<ChartObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<SymbolObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_formats: Vec<ConditionalFormat>,
}

impl Sheet {
    /// An empty, visible, unprotected sheet with the default grid.
    pub fn new(sheet_id: impl Into<SheetId>, name: impl Into<String>) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            name: name.into(),
            visible: true,
            protected: false,
            protection_password: None,
            cell_locks: BTreeMap::new(),
            grid: GridConfig::default(),
            cells: BTreeMap::new(),
            images: Vec::new(),
            shapes: Vec::new(),
            charts: Vec::new(),
            links: Vec::new(),
            symbols: Vec::new(),
            conditional_formats: Vec::new(),
        }
    }

    pub fn cell(&self, key: &str) -> Option<&CellData> {
        self.cells.get(stored_key(key).as_ref())
    }

    /// Locked if the whole sheet is protected, or the key is individually
    /// locked. Sheet protection takes precedence over per-cell entries.
    pub fn is_cell_locked(&self, key: &str) -> bool {
        self.protected
            || self
                .cell_locks
                .get(stored_key(key).as_ref())
                .copied()
                .unwrap_or(false)
    }

    /// Conditional formats whose range covers `cell`.
    pub fn formats_for(&self, cell: &CellRef) -> impl Iterator<Item = &ConditionalFormat> + '_ {
        let cell = *cell;
        self.conditional_formats.iter().filter(move |f| {
            crate::cell_ref::CellRange::parse(&f.range).is_some_and(|r| r.contains(&cell))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sheet_defaults() {
        let s = Sheet::new("sheet-1", "Sheet1");
        assert!(s.visible);
        assert!(!s.protected);
        assert!(s.cells.is_empty());
        assert_eq!(s.grid.row_count, DEFAULT_ROW_COUNT);
    }

    #[test]
    fn test_lock_precedence() {
        let mut s = Sheet::new("s", "S");
        s.cell_locks.insert("A1".into(), true);
        s.cell_locks.insert("B1".into(), false);
        assert!(s.is_cell_locked("A1"));
        assert!(!s.is_cell_locked("B1"));
        assert!(!s.is_cell_locked("C1"));

        s.protected = true;
        assert!(s.is_cell_locked("B1"));
        assert!(s.is_cell_locked("Z99"));
    }

    #[test]
    fn test_lookups_ignore_key_case() {
        let mut s = Sheet::new("s", "S");
        s.cells.insert("B2".into(), CellData::with_value(4.0));
        s.cell_locks.insert("AA10".into(), true);
        assert!(s.cell("b2").is_some());
        assert!(s.is_cell_locked("aa10"));
        assert!(s.is_cell_locked("aA10"));
        assert!(s.cell("nonsense").is_none());
    }

    #[test]
    fn test_grid_bounds_and_sizes() {
        let mut grid = GridConfig::default();
        grid.row_sizes.insert(0, 40.0);
        assert!(grid.contains(&CellRef::new(1, 0)));
        assert!(grid.contains(&CellRef::new(100, 25)));
        assert!(!grid.contains(&CellRef::new(101, 0)));
        assert!(!grid.contains(&CellRef::new(1, 26)));
        assert_eq!(grid.row_height(0), 40.0);
        assert_eq!(grid.row_height(1), DEFAULT_ROW_HEIGHT);
    }

    #[test]
    fn test_row_size_keys_roundtrip_as_strings() {
        let mut s = Sheet::new("s", "S");
        s.grid.row_sizes.insert(3, 55.5);
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["grid"]["rowSizes"]["3"], 55.5);
        let back: Sheet = serde_json::from_value(v).unwrap();
        assert_eq!(back, s);
    }
}
