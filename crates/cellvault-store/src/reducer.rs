//! The transition function.
//!
//! `apply` is deterministic in `(state, action, now)` and never fails:
//! anything it cannot apply (unknown ids, invalid keys, payloads that would
//! break a sheet invariant) leaves the state exactly as it was.
//!
//! Sheet-level actions are applied to a copy of the sheet, which replaces the
//! original only if it changed and still passes [`validate_sheet`]. Cell keys
//! are canonicalized (`"b2"` is stored as `"B2"`), and writing a cell or lock
//! past the grid bounds grows the grid to include it.

use cellvault_types::{
    CellData, CellRef, DocumentState, Sheet, SheetObject, validate_sheet,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::action::{Action, CellPatch, ObjectPatch, is_valid_size};

/// Apply `action` to a copy of `state` and return the result.
pub fn reduce(state: &DocumentState, action: &Action, now: u64) -> DocumentState {
    let mut next = state.clone();
    apply(&mut next, action, now);
    next
}

/// Apply `action` in place. Returns whether the state changed.
///
/// A change made by a content action refreshes `metadata.updatedAt` to
/// `max(updatedAt, now)`; replacements, navigation and history appends leave
/// it alone.
pub fn apply(state: &mut DocumentState, action: &Action, now: u64) -> bool {
    let changed = match action {
        Action::SetDocument(doc) | Action::RestoreFromIpfs(doc) => replace(state, doc),

        Action::UpdateMetadata(patch) => {
            let before = state.metadata.clone();
            patch.apply_to(&mut state.metadata);
            state.metadata != before
        }

        Action::AddSheet { sheet } => add_sheet(state, sheet),
        Action::RemoveSheet { sheet_id } => remove_sheet(state, sheet_id),

        Action::RenameSheet { sheet_id, name } => edit_sheet(state, sheet_id, |sheet| {
            sheet.name = name.clone();
        }),

        Action::SetActiveSheet { sheet_id } => {
            if state.active_sheet_id == *sheet_id || state.sheet(sheet_id).is_none() {
                false
            } else {
                state.active_sheet_id = sheet_id.clone();
                true
            }
        }

        Action::UpdateCell { sheet_id, cell_key, data } => edit_sheet(state, sheet_id, |sheet| {
            patch_cell(sheet, cell_key, data);
        }),

        Action::UpdateCells { sheet_id, updates } => edit_sheet(state, sheet_id, |sheet| {
            for (key, patch) in updates {
                patch_cell(sheet, key, patch);
            }
        }),

        Action::SetCellStyle { sheet_id, cell_key, style } => {
            let patch = CellPatch::default().with_style(style.clone());
            edit_sheet(state, sheet_id, |sheet| patch_cell(sheet, cell_key, &patch))
        }

        Action::AddImage { sheet_id, image } => edit_sheet(state, sheet_id, |sheet| {
            sheet.images.push(image.clone());
        }),
        Action::UpdateImage { sheet_id, image_id, updates } => {
            edit_sheet(state, sheet_id, |sheet| update_object(&mut sheet.images, image_id, updates))
        }
        Action::RemoveImage { sheet_id, image_id } => edit_sheet(state, sheet_id, |sheet| {
            sheet.images.retain(|o| o.id() != image_id);
        }),

        Action::AddShape { sheet_id, shape } => edit_sheet(state, sheet_id, |sheet| {
            sheet.shapes.push(shape.clone());
        }),
        Action::UpdateShape { sheet_id, shape_id, updates } => {
            edit_sheet(state, sheet_id, |sheet| update_object(&mut sheet.shapes, shape_id, updates))
        }
        Action::RemoveShape { sheet_id, shape_id } => edit_sheet(state, sheet_id, |sheet| {
            sheet.shapes.retain(|o| o.id() != shape_id);
        }),

        Action::AddChart { sheet_id, chart } => edit_sheet(state, sheet_id, |sheet| {
            sheet.charts.push(chart.clone());
        }),
        Action::UpdateChart { sheet_id, chart_id, updates } => {
            edit_sheet(state, sheet_id, |sheet| update_object(&mut sheet.charts, chart_id, updates))
        }
        Action::RemoveChart { sheet_id, chart_id } => edit_sheet(state, sheet_id, |sheet| {
            sheet.charts.retain(|o| o.id() != chart_id);
        }),

        Action::UpdateGridConfig { sheet_id, config } => edit_sheet(state, sheet_id, |sheet| {
            config.apply_to(&mut sheet.grid);
        }),

        Action::SetRowSize { sheet_id, row, size } => {
            if !is_valid_size(*size) {
                return false;
            }
            edit_sheet(state, sheet_id, |sheet| {
                sheet.grid.row_count = sheet.grid.row_count.max(row.saturating_add(1));
                sheet.grid.row_sizes.insert(*row, *size);
            })
        }

        Action::SetColumnSize { sheet_id, column, size } => {
            if !is_valid_size(*size) {
                return false;
            }
            edit_sheet(state, sheet_id, |sheet| {
                sheet.grid.column_count = sheet.grid.column_count.max(column.saturating_add(1));
                sheet.grid.column_sizes.insert(*column, *size);
            })
        }

        Action::AddConditionalFormat { sheet_id, format } => edit_sheet(state, sheet_id, |sheet| {
            sheet.conditional_formats.push(format.clone());
        }),
        Action::RemoveConditionalFormat { sheet_id, format_id } => {
            edit_sheet(state, sheet_id, |sheet| {
                sheet.conditional_formats.retain(|f| f.id != *format_id);
            })
        }

        Action::SetDataValidation { sheet_id, cell_key, validation } => {
            let patch = CellPatch {
                validation: Some(validation.clone()),
                ..Default::default()
            };
            edit_sheet(state, sheet_id, |sheet| patch_cell(sheet, cell_key, &patch))
        }

        Action::SetSparkline { sheet_id, cell_key, sparkline } => {
            let patch = CellPatch {
                sparkline: Some(sparkline.clone()),
                ..Default::default()
            };
            edit_sheet(state, sheet_id, |sheet| patch_cell(sheet, cell_key, &patch))
        }

        Action::ProtectSheet { sheet_id, protected, password } => {
            edit_sheet(state, sheet_id, |sheet| {
                sheet.protected = *protected;
                sheet.protection_password = if *protected { password.clone() } else { None };
            })
        }

        Action::LockCells { sheet_id, cell_keys, locked } => edit_sheet(state, sheet_id, |sheet| {
            for key in cell_keys {
                let Some(cell) = CellRef::parse(key) else {
                    continue;
                };
                grow_to_fit(sheet, &cell);
                sheet.cell_locks.insert(cell.key(), *locked);
            }
        }),

        Action::UpdateSettings(patch) => {
            let mut settings = state.settings.clone().unwrap_or_default();
            patch.apply_to(&mut settings);
            if state.settings.as_ref() == Some(&settings) {
                false
            } else {
                state.settings = Some(settings);
                true
            }
        }

        Action::RecordVersion { entry } => {
            state.version_history.push(entry.clone());
            true
        }

        Action::Unknown => false,
    };

    if changed && action.kind().touches_updated_at() {
        state.metadata.updated_at = state.metadata.updated_at.max(now);
    }
    changed
}

fn replace(state: &mut DocumentState, doc: &DocumentState) -> bool {
    if *state == *doc {
        return false;
    }
    *state = doc.clone();
    true
}

fn add_sheet(state: &mut DocumentState, sheet: &Sheet) -> bool {
    if state.sheet(&sheet.sheet_id).is_some() || validate_sheet(sheet).is_err() {
        return false;
    }
    state.sheets.push(sheet.clone());
    state.metadata.sheet_count = state.sheets.len();
    if state.active_sheet_id.is_empty() || state.active_sheet().is_none() {
        state.active_sheet_id = sheet.sheet_id.clone();
    }
    true
}

fn remove_sheet(state: &mut DocumentState, sheet_id: &str) -> bool {
    let before = state.sheets.len();
    state.sheets.retain(|s| s.sheet_id != sheet_id);
    if state.sheets.len() == before {
        return false;
    }
    state.metadata.sheet_count = state.sheets.len();
    if state.active_sheet_id == sheet_id {
        state.active_sheet_id = state
            .sheets
            .first()
            .map(|s| s.sheet_id.clone())
            .unwrap_or_default();
    }
    true
}

/// Run `edit` on a copy of the sheet and keep the copy if it differs from the
/// original and is still valid.
fn edit_sheet<F>(state: &mut DocumentState, sheet_id: &str, edit: F) -> bool
where
    F: FnOnce(&mut Sheet),
{
    let Some(sheet) = state.sheet_mut(sheet_id) else {
        return false;
    };
    let mut next = sheet.clone();
    edit(&mut next);
    if next == *sheet || validate_sheet(&next).is_err() {
        return false;
    }
    *sheet = next;
    true
}

/// Merge `patch` into the cell at `key`, creating it if needed.
///
/// Invalid keys are skipped. A cell left with nothing in it is dropped so the
/// map only holds populated cells.
fn patch_cell(sheet: &mut Sheet, key: &str, patch: &CellPatch) {
    let Some(cell_ref) = CellRef::parse(key) else {
        return;
    };
    let key = cell_ref.key();
    let mut cell = sheet.cells.get(&key).cloned().unwrap_or_default();
    patch.apply_to(&mut cell);
    if cell == CellData::default() {
        sheet.cells.remove(&key);
    } else {
        grow_to_fit(sheet, &cell_ref);
        sheet.cells.insert(key, cell);
    }
}

fn grow_to_fit(sheet: &mut Sheet, cell: &CellRef) {
    let grid = &mut sheet.grid;
    grid.row_count = grid.row_count.max(cell.row);
    grid.column_count = grid.column_count.max(cell.col.saturating_add(1));
}

fn update_object<T>(objects: &mut [T], id: &str, patch: &ObjectPatch)
where
    T: SheetObject + Serialize + DeserializeOwned,
{
    if let Some(slot) = objects.iter_mut().find(|o| o.id() == id) {
        if let Some(merged) = patch.merged(&*slot) {
            *slot = merged;
        }
    }
}
