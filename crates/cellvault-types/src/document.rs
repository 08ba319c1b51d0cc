//! The root document state.

use serde::{Deserialize, Serialize};

use crate::ids::{DocumentId, SheetId};
use crate::sheet::Sheet;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Schema version written into new documents.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Sheet id given to the first sheet of a new document.
pub const DEFAULT_SHEET_ID: &str = "sheet-1";

/// Longest auto-save delay honoured, in seconds (one day).
pub const MAX_AUTO_SAVE_INTERVAL: u64 = 86_400;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_comment: bool,
    #[serde(default)]
    pub can_share: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub public: bool,
}

/// Descriptive data about a document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub title: String,
    pub owner: String,
    /// Unix millis.
    pub created_at: u64,
    /// Unix millis; never decreases.
    pub updated_at: u64,
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Always equal to the number of sheets.
    pub sheet_count: usize,
    /// Schema version this document was written with.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collaborators: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_version() -> String {
    SCHEMA_VERSION.to_string()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationMode {
    #[default]
    Automatic,
    Manual,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceStyle {
    #[default]
    A1,
    R1c1,
}

/// Per-document behavior flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSettings {
    #[serde(default = "default_true")]
    pub auto_save: bool,
    /// Auto-save delay in whole seconds.
    #[serde(default = "default_interval")]
    pub auto_save_interval: u64,
    #[serde(default = "default_true")]
    pub show_formula_bar: bool,
    #[serde(default)]
    pub calculation_mode: CalculationMode,
    #[serde(default)]
    pub reference_style: ReferenceStyle,
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    30
}

impl DocumentSettings {
    /// `auto_save_interval` clamped to `1..=MAX_AUTO_SAVE_INTERVAL`.
    pub fn effective_interval_secs(&self) -> u64 {
        self.auto_save_interval.clamp(1, MAX_AUTO_SAVE_INTERVAL)
    }
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            auto_save: true,
            auto_save_interval: default_interval(),
            show_formula_bar: true,
            calculation_mode: CalculationMode::default(),
            reference_style: ReferenceStyle::default(),
        }
    }
}

/// One successful persistence of the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    /// Content id returned by the store, kept opaque.
    pub content_id: String,
    /// Unix millis.
    pub timestamp: u64,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The whole persisted state of one spreadsheet document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    /// Assigned at creation, immutable afterwards.
    pub document_id: DocumentId,
    pub metadata: Metadata,
    /// Display order.
    #[serde(default)]
    pub sheets: Vec<Sheet>,
    /// Empty string when there are no sheets.
    #[serde(default)]
    pub active_sheet_id: SheetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<DocumentSettings>,
    /// Append-only.
    #[serde(default)]
    pub version_history: Vec<VersionEntry>,
}

impl DocumentState {
    /// A fresh document with one empty, active sheet.
    pub fn new(title: impl Into<String>, owner: impl Into<String>, now: u64) -> Self {
        let sheet = Sheet::new(DEFAULT_SHEET_ID, "Sheet1");
        Self {
            document_id: DocumentId::new(),
            metadata: Metadata {
                title: title.into(),
                owner: owner.into(),
                created_at: now,
                updated_at: now,
                theme: default_theme(),
                sheet_count: 1,
                version: default_version(),
                collaborators: None,
                permissions: None,
            },
            active_sheet_id: sheet.sheet_id.clone(),
            sheets: vec![sheet],
            settings: Some(DocumentSettings::default()),
            version_history: Vec::new(),
        }
    }

    pub fn sheet(&self, sheet_id: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.sheet_id == sheet_id)
    }

    pub fn sheet_mut(&mut self, sheet_id: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.sheet_id == sheet_id)
    }

    /// The sheet whose id equals `active_sheet_id`, if any.
    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.sheet(&self.active_sheet_id)
    }

    /// Auto-save flag of this document; absent settings mean enabled.
    pub fn auto_save_enabled(&self) -> bool {
        self.settings.as_ref().is_none_or(|s| s.auto_save)
    }

    pub fn latest_version(&self) -> Option<&VersionEntry> {
        self.version_history.last()
    }
}

impl Default for DocumentState {
    fn default() -> Self {
        Self::new("Untitled", "", crate::now_millis())
    }
}
