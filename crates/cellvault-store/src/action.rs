//! The mutation vocabulary.
//!
//! Every change to a document goes through one [`Action`]. On the wire an
//! action is `{"type": "UPDATE_CELL", "payload": {...}}`; payload fields are
//! camelCase. Unrecognized types decode to [`Action::Unknown`], which the
//! reducer ignores.
//!
//! Partial payloads distinguish "absent" from "present and null": an absent
//! field is left alone, a null clears the field it names.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use cellvault_types::{
    CalculationMode, CellData, CellKey, CellStyle, CellType, CellValue, ChartObject,
    ConditionalFormat, DataValidation, DocumentSettings, DocumentState, GridConfig, ImageObject,
    MAX_AUTO_SAVE_INTERVAL, MergeSpan, Metadata, ObjectId, Permissions, ReferenceStyle,
    ShapeObject, Sheet, SheetId, Sparkline, VersionEntry,
};

/// Deserialize a field that is present, null included, as `Some`.
///
/// Combined with `#[serde(default)]` this turns `Option<Option<T>>` into a
/// three-state field: missing, explicit null, or a value.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A single document mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Action {
    /// Replace the whole document.
    SetDocument(Box<DocumentState>),
    UpdateMetadata(MetadataPatch),
    AddSheet {
        sheet: Box<Sheet>,
    },
    RemoveSheet {
        sheet_id: SheetId,
    },
    RenameSheet {
        sheet_id: SheetId,
        name: String,
    },
    SetActiveSheet {
        sheet_id: SheetId,
    },
    UpdateCell {
        sheet_id: SheetId,
        cell_key: CellKey,
        data: CellPatch,
    },
    /// Batch form of `UpdateCell`, applied as one transition.
    UpdateCells {
        sheet_id: SheetId,
        updates: BTreeMap<CellKey, CellPatch>,
    },
    SetCellStyle {
        sheet_id: SheetId,
        cell_key: CellKey,
        style: CellStyle,
    },
    AddImage {
        sheet_id: SheetId,
        image: ImageObject,
    },
    UpdateImage {
        sheet_id: SheetId,
        image_id: ObjectId,
        updates: ObjectPatch,
    },
    RemoveImage {
        sheet_id: SheetId,
        image_id: ObjectId,
    },
    AddShape {
        sheet_id: SheetId,
        shape: ShapeObject,
    },
    UpdateShape {
        sheet_id: SheetId,
        shape_id: ObjectId,
        updates: ObjectPatch,
    },
    RemoveShape {
        sheet_id: SheetId,
        shape_id: ObjectId,
    },
    AddChart {
        sheet_id: SheetId,
        chart: ChartObject,
    },
    UpdateChart {
        sheet_id: SheetId,
        chart_id: ObjectId,
        updates: ObjectPatch,
    },
    RemoveChart {
        sheet_id: SheetId,
        chart_id: ObjectId,
    },
    UpdateGridConfig {
        sheet_id: SheetId,
        config: GridConfigPatch,
    },
    SetRowSize {
        sheet_id: SheetId,
        /// 0-based.
        row: u32,
        size: f64,
    },
    SetColumnSize {
        sheet_id: SheetId,
        /// 0-based.
        column: u32,
        size: f64,
    },
    AddConditionalFormat {
        sheet_id: SheetId,
        format: ConditionalFormat,
    },
    RemoveConditionalFormat {
        sheet_id: SheetId,
        format_id: ObjectId,
    },
    /// `None` removes the rule.
    SetDataValidation {
        sheet_id: SheetId,
        cell_key: CellKey,
        #[serde(default)]
        validation: Option<DataValidation>,
    },
    /// `None` removes the sparkline.
    SetSparkline {
        sheet_id: SheetId,
        cell_key: CellKey,
        #[serde(default)]
        sparkline: Option<Sparkline>,
    },
    ProtectSheet {
        sheet_id: SheetId,
        protected: bool,
        /// Already-hashed password.
        #[serde(default)]
        password: Option<String>,
    },
    LockCells {
        sheet_id: SheetId,
        cell_keys: Vec<CellKey>,
        locked: bool,
    },
    /// Replace the whole document with one fetched from content storage.
    RestoreFromIpfs(Box<DocumentState>),
    UpdateSettings(SettingsPatch),
    /// Append a version-history entry after a successful save.
    RecordVersion {
        entry: VersionEntry,
    },
    #[serde(other)]
    Unknown,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::SetDocument(_) => ActionKind::SetDocument,
            Action::UpdateMetadata(_) => ActionKind::UpdateMetadata,
            Action::AddSheet { .. } => ActionKind::AddSheet,
            Action::RemoveSheet { .. } => ActionKind::RemoveSheet,
            Action::RenameSheet { .. } => ActionKind::RenameSheet,
            Action::SetActiveSheet { .. } => ActionKind::SetActiveSheet,
            Action::UpdateCell { .. } => ActionKind::UpdateCell,
            Action::UpdateCells { .. } => ActionKind::UpdateCells,
            Action::SetCellStyle { .. } => ActionKind::SetCellStyle,
            Action::AddImage { .. } => ActionKind::AddImage,
            Action::UpdateImage { .. } => ActionKind::UpdateImage,
            Action::RemoveImage { .. } => ActionKind::RemoveImage,
            Action::AddShape { .. } => ActionKind::AddShape,
            Action::UpdateShape { .. } => ActionKind::UpdateShape,
            Action::RemoveShape { .. } => ActionKind::RemoveShape,
            Action::AddChart { .. } => ActionKind::AddChart,
            Action::UpdateChart { .. } => ActionKind::UpdateChart,
            Action::RemoveChart { .. } => ActionKind::RemoveChart,
            Action::UpdateGridConfig { .. } => ActionKind::UpdateGridConfig,
            Action::SetRowSize { .. } => ActionKind::SetRowSize,
            Action::SetColumnSize { .. } => ActionKind::SetColumnSize,
            Action::AddConditionalFormat { .. } => ActionKind::AddConditionalFormat,
            Action::RemoveConditionalFormat { .. } => ActionKind::RemoveConditionalFormat,
            Action::SetDataValidation { .. } => ActionKind::SetDataValidation,
            Action::SetSparkline { .. } => ActionKind::SetSparkline,
            Action::ProtectSheet { .. } => ActionKind::ProtectSheet,
            Action::LockCells { .. } => ActionKind::LockCells,
            Action::RestoreFromIpfs(_) => ActionKind::RestoreFromIpfs,
            Action::UpdateSettings(_) => ActionKind::UpdateSettings,
            Action::RecordVersion { .. } => ActionKind::RecordVersion,
            Action::Unknown => ActionKind::Unknown,
        }
    }

    /// Decode an action from loose JSON. Anything that does not decode
    /// becomes [`Action::Unknown`].
    pub fn from_value_lossy(value: serde_json::Value) -> Action {
        match serde_json::from_value(value) {
            Ok(action) => action,
            Err(e) => {
                tracing::debug!(error = %e, "undecodable action treated as unknown");
                Action::Unknown
            }
        }
    }
}

/// Name of an action variant, matching its wire tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    SetDocument,
    UpdateMetadata,
    AddSheet,
    RemoveSheet,
    RenameSheet,
    SetActiveSheet,
    UpdateCell,
    UpdateCells,
    SetCellStyle,
    AddImage,
    UpdateImage,
    RemoveImage,
    AddShape,
    UpdateShape,
    RemoveShape,
    AddChart,
    UpdateChart,
    RemoveChart,
    UpdateGridConfig,
    SetRowSize,
    SetColumnSize,
    AddConditionalFormat,
    RemoveConditionalFormat,
    SetDataValidation,
    SetSparkline,
    ProtectSheet,
    LockCells,
    RestoreFromIpfs,
    UpdateSettings,
    RecordVersion,
    Unknown,
}

impl ActionKind {
    /// Wholesale replacement of the document.
    pub fn is_replacement(&self) -> bool {
        matches!(self, ActionKind::SetDocument | ActionKind::RestoreFromIpfs)
    }

    /// Changes the user would want saved. Replacements, history appends and
    /// unknown actions are not edits.
    pub fn is_content_edit(&self) -> bool {
        !self.is_replacement() && !matches!(self, ActionKind::RecordVersion | ActionKind::Unknown)
    }

    /// Whether a change made by this action refreshes `metadata.updatedAt`.
    pub fn touches_updated_at(&self) -> bool {
        self.is_content_edit() && *self != ActionKind::SetActiveSheet
    }
}

/// Partial update of one cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellPatch {
    /// A present null sets the value to null.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub formula: Option<Option<String>>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub cell_type: Option<Option<CellType>>,
    /// Merged into the existing style rather than replacing it.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub style: Option<Option<CellStyle>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub comment: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub validation: Option<Option<DataValidation>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub merged_with: Option<Option<CellKey>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_merge_parent: Option<bool>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub merge_span: Option<Option<MergeSpan>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub sparkline: Option<Option<Sparkline>>,
}

impl CellPatch {
    /// A patch that only sets the value.
    pub fn value(value: impl Into<CellValue>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// A patch that sets a formula along with its last computed value.
    pub fn formula(formula: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self {
            value: Some(value.into()),
            formula: Some(Some(formula.into())),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: CellStyle) -> Self {
        self.style = Some(Some(style));
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == CellPatch::default()
    }

    /// Shallow-merge this patch into `cell`.
    pub fn apply_to(&self, cell: &mut CellData) {
        fn set<T: Clone>(slot: &mut Option<T>, patch: &Option<Option<T>>) {
            if let Some(next) = patch {
                *slot = next.clone();
            }
        }

        if let Some(value) = &self.value {
            cell.value = value.clone();
        }
        set(&mut cell.formula, &self.formula);
        set(&mut cell.cell_type, &self.cell_type);
        match &self.style {
            Some(Some(style)) => {
                cell.style = Some(match &cell.style {
                    Some(base) => base.merged(style),
                    None => style.clone(),
                });
            }
            Some(None) => cell.style = None,
            None => {}
        }
        set(&mut cell.comment, &self.comment);
        set(&mut cell.hyperlink, &self.hyperlink);
        set(&mut cell.validation, &self.validation);
        set(&mut cell.merged_with, &self.merged_with);
        if let Some(parent) = self.is_merge_parent {
            cell.is_merge_parent = parent;
        }
        set(&mut cell.merge_span, &self.merge_span);
        if let Some(locked) = self.locked {
            cell.locked = locked;
        }
        if let Some(hidden) = self.hidden {
            cell.hidden = hidden;
        }
        set(&mut cell.sparkline, &self.sparkline);
    }
}

/// Partial update of document metadata.
///
/// Timestamps, sheet count and schema version are maintained by the reducer
/// and cannot be patched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub collaborators: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Option<Permissions>>,
}

impl MetadataPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, metadata: &mut Metadata) {
        if let Some(title) = &self.title {
            metadata.title = title.clone();
        }
        if let Some(owner) = &self.owner {
            metadata.owner = owner.clone();
        }
        if let Some(theme) = &self.theme {
            metadata.theme = theme.clone();
        }
        if let Some(collaborators) = &self.collaborators {
            metadata.collaborators = collaborators.clone();
        }
        if let Some(permissions) = &self.permissions {
            metadata.permissions = permissions.clone();
        }
    }
}

/// Partial update of a sheet's grid configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_row_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_column_width: Option<f64>,
    /// Replaces the whole override map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_sizes: Option<BTreeMap<u32, f64>>,
    /// Replaces the whole override map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_sizes: Option<BTreeMap<u32, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen_rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen_columns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_gridlines: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_headers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_rows: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_columns: Option<Vec<u32>>,
}

impl GridConfigPatch {
    /// Apply to `grid`. Returns `false`, leaving `grid` untouched, when a
    /// size in the patch is negative or not finite.
    pub fn apply_to(&self, grid: &mut GridConfig) -> bool {
        let sizes_ok = self
            .default_row_height
            .iter()
            .chain(self.default_column_width.iter())
            .chain(self.row_sizes.iter().flat_map(|m| m.values()))
            .chain(self.column_sizes.iter().flat_map(|m| m.values()))
            .all(|size| is_valid_size(*size));
        if !sizes_ok {
            return false;
        }

        macro_rules! take {
            ($field:ident) => {
                if let Some(v) = &self.$field {
                    grid.$field = v.clone();
                }
            };
        }
        take!(row_count);
        take!(column_count);
        take!(default_row_height);
        take!(default_column_width);
        take!(row_sizes);
        take!(column_sizes);
        take!(frozen_rows);
        take!(frozen_columns);
        take!(show_gridlines);
        take!(show_headers);
        take!(hidden_rows);
        take!(hidden_columns);
        true
    }
}

/// Row heights and column widths must be finite and non-negative.
pub fn is_valid_size(size: f64) -> bool {
    size.is_finite() && size >= 0.0
}

/// Partial update of document settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_save: Option<bool>,
    /// Whole seconds; clamped to `1..=MAX_AUTO_SAVE_INTERVAL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_save_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_formula_bar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_mode: Option<CalculationMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_style: Option<ReferenceStyle>,
}

impl SettingsPatch {
    pub fn auto_save(enabled: bool) -> Self {
        Self {
            auto_save: Some(enabled),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, settings: &mut DocumentSettings) {
        if let Some(on) = self.auto_save {
            settings.auto_save = on;
        }
        if let Some(secs) = self.auto_save_interval {
            settings.auto_save_interval = secs.clamp(1, MAX_AUTO_SAVE_INTERVAL);
        }
        if let Some(show) = self.show_formula_bar {
            settings.show_formula_bar = show;
        }
        if let Some(mode) = self.calculation_mode {
            settings.calculation_mode = mode;
        }
        if let Some(style) = self.reference_style {
            settings.reference_style = style;
        }
    }
}

/// Shallow JSON merge for images, shapes and charts.
///
/// Top-level keys of the patch replace the entity's keys in its wire form.
/// The `id` key is ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectPatch(pub serde_json::Map<String, serde_json::Value>);

impl ObjectPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of one field in wire (camelCase) form.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Merge into `target`. Returns `None` if the merged form no longer
    /// decodes as `T`.
    pub fn merged<T>(&self, target: &T) -> Option<T>
    where
        T: Serialize + serde::de::DeserializeOwned,
    {
        let serde_json::Value::Object(mut fields) = serde_json::to_value(target).ok()? else {
            return None;
        };
        for (key, value) in &self.0 {
            if key == "id" {
                continue;
            }
            fields.insert(key.clone(), value.clone());
        }
        serde_json::from_value(serde_json::Value::Object(fields)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let action = Action::UpdateCell {
            sheet_id: "sheet-1".into(),
            cell_key: "A1".into(),
            data: CellPatch::value("x"),
        };
        let v = serde_json::to_value(&action).unwrap();
        assert_eq!(v["type"], "UPDATE_CELL");
        assert_eq!(v["payload"]["sheetId"], "sheet-1");
        assert_eq!(v["payload"]["cellKey"], "A1");
        assert_eq!(v["payload"]["data"], json!({"value": "x"}));
        let back: Action = serde_json::from_value(v).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn test_replacement_payload_is_the_document() {
        let doc = DocumentState::new("t", "o", 1);
        let v = serde_json::to_value(Action::RestoreFromIpfs(Box::new(doc.clone()))).unwrap();
        assert_eq!(v["type"], "RESTORE_FROM_IPFS");
        assert_eq!(v["payload"]["metadata"]["title"], "t");
    }

    #[test]
    fn test_unknown_and_malformed_actions() {
        let unknown = Action::from_value_lossy(json!({"type": "FROBNICATE", "payload": {"x": 1}}));
        assert_eq!(unknown, Action::Unknown);
        let missing_field = Action::from_value_lossy(json!({"type": "RENAME_SHEET", "payload": {"sheetId": "s"}}));
        assert_eq!(missing_field, Action::Unknown);
        assert_eq!(Action::from_value_lossy(json!(42)), Action::Unknown);
    }

    #[test]
    fn test_kind_names_match_wire_tags() {
        let action = Action::LockCells {
            sheet_id: "s".into(),
            cell_keys: vec!["A1".into()],
            locked: true,
        };
        let v = serde_json::to_value(&action).unwrap();
        assert_eq!(v["type"], action.kind().to_string());
        assert_eq!(ActionKind::RestoreFromIpfs.to_string(), "RESTORE_FROM_IPFS");
        assert_eq!("SET_SPARKLINE".parse::<ActionKind>().unwrap(), ActionKind::SetSparkline);
    }

    #[test]
    fn test_kind_classes() {
        assert!(ActionKind::UpdateCell.is_content_edit());
        assert!(ActionKind::SetActiveSheet.is_content_edit());
        assert!(!ActionKind::SetActiveSheet.touches_updated_at());
        assert!(!ActionKind::RecordVersion.is_content_edit());
        assert!(!ActionKind::SetDocument.is_content_edit());
        assert!(ActionKind::RestoreFromIpfs.is_replacement());
    }

    #[test]
    fn test_cell_patch_absent_vs_null() {
        let patch: CellPatch = serde_json::from_value(json!({"comment": null})).unwrap();
        assert_eq!(patch.comment, Some(None));
        assert_eq!(patch.formula, None);

        let null_value: CellPatch = serde_json::from_value(json!({"value": null})).unwrap();
        assert_eq!(null_value.value, Some(CellValue::Null));

        let mut cell = CellData {
            value: "x".into(),
            comment: Some("note".into()),
            formula: Some("=1".into()),
            ..Default::default()
        };
        patch.apply_to(&mut cell);
        assert_eq!(cell.comment, None);
        assert_eq!(cell.formula.as_deref(), Some("=1"));
        assert_eq!(cell.value, CellValue::from("x"));
    }

    #[test]
    fn test_cell_patch_style_merges() {
        let mut cell = CellData {
            style: Some(CellStyle { bold: Some(true), ..Default::default() }),
            ..Default::default()
        };
        CellPatch::default()
            .with_style(CellStyle { italic: Some(true), ..Default::default() })
            .apply_to(&mut cell);
        let style = cell.style.unwrap();
        assert_eq!(style.bold, Some(true));
        assert_eq!(style.italic, Some(true));
    }

    #[test]
    fn test_grid_patch_rejects_bad_sizes() {
        let mut grid = GridConfig::default();
        let patch = GridConfigPatch {
            row_count: Some(500),
            default_row_height: Some(f64::INFINITY),
            ..Default::default()
        };
        assert!(!patch.apply_to(&mut grid));
        assert_eq!(grid, GridConfig::default());

        let ok = GridConfigPatch { frozen_rows: Some(2), ..Default::default() };
        assert!(ok.apply_to(&mut grid));
        assert_eq!(grid.frozen_rows, 2);
    }

    #[test]
    fn test_settings_interval_clamped() {
        let mut settings = DocumentSettings::default();
        SettingsPatch { auto_save_interval: Some(0), ..Default::default() }.apply_to(&mut settings);
        assert_eq!(settings.auto_save_interval, 1);
        SettingsPatch { auto_save_interval: Some(u64::MAX), ..Default::default() }
            .apply_to(&mut settings);
        assert_eq!(settings.auto_save_interval, MAX_AUTO_SAVE_INTERVAL);
    }

    #[test]
    fn test_object_patch_keeps_id_and_rejects_bad_shapes() {
        let image = ImageObject::new("img-1", "src", Default::default());
        let patch = ObjectPatch::new().set("id", "other").set("layer", 3).set("x", 10.0);
        let merged = patch.merged(&image).unwrap();
        assert_eq!(merged.id, "img-1");
        assert_eq!(merged.layer, 3);
        assert_eq!(merged.placement.x, 10.0);

        let bad = ObjectPatch::new().set("layer", "top");
        assert!(bad.merged(&image).is_none());
    }
}
