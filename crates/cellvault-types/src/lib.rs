//! Document schema for cellvault spreadsheets.
//!
//! This crate is the leaf of the workspace: plain data types with a stable
//! camelCase JSON encoding, plus the structural checks applied to documents
//! read back from storage. It has no internal cellvault dependencies.
//!
//! # Shape of a document
//!
//! ```text
//! DocumentState (DocumentId)
//!     └── Metadata (title, owner, timestamps, sheetCount)
//!     └── DocumentSettings (auto-save flag and interval)
//!     └── VersionHistory (content ids, append-only)
//!     └── Sheet (SheetId) × N, one of them active
//!             └── GridConfig (bounds, sizes, frozen panes)
//!             └── cells: CellKey ("B12") → CellData
//!             └── images, shapes, charts, links, symbols
//!             └── conditional formats
//! ```
//!
//! # Key Types
//!
//! |-------------------------|-------------------------------------------|
//! | Type                    | Purpose                                   |
//! |-------------------------|-------------------------------------------|
//! | [`DocumentState`]       | The whole persisted document              |
//! | [`Sheet`]               | One tab: grid, cells, objects             |
//! | [`CellData`]            | Value, formula, style, merge info         |
//! | [`CellRef`]             | Parsed A1 key (1-based row, 0-based col)  |
//! | [`ConditionalFormat`]   | Prioritized style rules over a range      |
//! | [`VersionEntry`]        | One successful save                       |
//! |-------------------------|-------------------------------------------|

pub mod cell;
pub mod cell_ref;
pub mod document;
pub mod format;
pub mod ids;
pub mod objects;
pub mod sheet;
pub mod validate;

pub use cell::{
    BorderSide, BorderStyle, Borders, CellData, CellStyle, CellType, CellValue, DataValidation,
    HorizontalAlign, MergeSpan, Sparkline, SparklineKind, ValidationKind, VerticalAlign,
};
pub use cell_ref::{CellRange, CellRef, column_index, column_letters};
pub use document::{
    CalculationMode, DEFAULT_SHEET_ID, DocumentSettings, DocumentState, MAX_AUTO_SAVE_INTERVAL,
    Metadata, Permissions, ReferenceStyle, SCHEMA_VERSION, VersionEntry,
};
pub use format::{ComparisonOperator, ConditionalFormat, ConditionalRule, RuleKind};
pub use ids::{CellKey, DocumentId, ObjectId, SheetId, new_object_id};
pub use objects::{
    AxisOptions, ChartKind, ChartObject, ChartOptions, ImageObject, LegendOptions,
    LegendPosition, LinkObject, Placement, SeriesOptions, ShapeKind, ShapeObject, SheetObject,
    SymbolObject, VisualObject,
};
pub use sheet::{GridConfig, Sheet};
pub use validate::{ValidationError, validate_document, validate_sheet};

/// Current time as Unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
