//! Convenience mutators and queries over a document.
//!
//! [`DocumentEditor`] needs two things from an implementor: a way to
//! dispatch an action and a way to look at the current state. Everything
//! else is built on those.
//!
//! [`DetachedEditor`] is the no-op implementation for code running without a
//! store: mutators warn and do nothing, queries answer `false`/`None`.
//! [`StoreHandle`] wraps an optional store and falls back to it.

use std::collections::BTreeMap;

use cellvault_types::{
    CellKey, CellStyle, ChartObject, DocumentState, ImageObject, Sheet, SheetId, Sparkline,
};

use crate::action::{Action, CellPatch, MetadataPatch};
use crate::store::{DocumentStore, SharedDocumentStore};

/// Hex BLAKE3 digest of a sheet protection password.
pub fn hash_password(password: &str) -> String {
    blake3::hash(password.as_bytes()).to_hex().to_string()
}

/// Mutation and query surface over one document.
pub trait DocumentEditor {
    /// Apply an action. Returns whether the document changed.
    fn dispatch(&self, action: Action) -> bool;

    /// Run `f` against the current document, or return `None` when there is
    /// no document to look at.
    fn inspect<R>(&self, f: impl FnOnce(&DocumentState) -> R) -> Option<R>;

    // ========================================================================
    // Mutators
    // ========================================================================

    fn update_cell(&self, sheet_id: &str, cell_key: &str, data: CellPatch) -> bool {
        self.dispatch(Action::UpdateCell {
            sheet_id: sheet_id.into(),
            cell_key: cell_key.into(),
            data,
        })
    }

    fn update_cells(&self, sheet_id: &str, updates: BTreeMap<CellKey, CellPatch>) -> bool {
        self.dispatch(Action::UpdateCells {
            sheet_id: sheet_id.into(),
            updates,
        })
    }

    fn set_cell_style(&self, sheet_id: &str, cell_key: &str, style: CellStyle) -> bool {
        self.dispatch(Action::SetCellStyle {
            sheet_id: sheet_id.into(),
            cell_key: cell_key.into(),
            style,
        })
    }

    fn add_image(&self, sheet_id: &str, image: ImageObject) -> bool {
        self.dispatch(Action::AddImage {
            sheet_id: sheet_id.into(),
            image,
        })
    }

    fn add_chart(&self, sheet_id: &str, chart: ChartObject) -> bool {
        self.dispatch(Action::AddChart {
            sheet_id: sheet_id.into(),
            chart,
        })
    }

    fn update_metadata(&self, patch: MetadataPatch) -> bool {
        self.dispatch(Action::UpdateMetadata(patch))
    }

    /// Set or, with `None`, remove a cell's sparkline.
    fn set_sparkline(&self, sheet_id: &str, cell_key: &str, sparkline: Option<Sparkline>) -> bool {
        self.dispatch(Action::SetSparkline {
            sheet_id: sheet_id.into(),
            cell_key: cell_key.into(),
            sparkline,
        })
    }

    /// Protect or unprotect a sheet. The password is hashed before it
    /// reaches the document.
    fn protect_sheet(&self, sheet_id: &str, protected: bool, password: Option<&str>) -> bool {
        self.dispatch(Action::ProtectSheet {
            sheet_id: sheet_id.into(),
            protected,
            password: password.map(hash_password),
        })
    }

    fn lock_cells<I, K>(&self, sheet_id: &str, cell_keys: I, locked: bool) -> bool
    where
        I: IntoIterator<Item = K>,
        K: Into<CellKey>,
    {
        self.dispatch(Action::LockCells {
            sheet_id: sheet_id.into(),
            cell_keys: cell_keys.into_iter().map(Into::into).collect(),
            locked,
        })
    }

    fn add_sheet(&self, sheet: Sheet) -> bool {
        self.dispatch(Action::AddSheet {
            sheet: Box::new(sheet),
        })
    }

    fn remove_sheet(&self, sheet_id: &str) -> bool {
        self.dispatch(Action::RemoveSheet {
            sheet_id: sheet_id.into(),
        })
    }

    fn rename_sheet(&self, sheet_id: &str, name: &str) -> bool {
        self.dispatch(Action::RenameSheet {
            sheet_id: sheet_id.into(),
            name: name.into(),
        })
    }

    fn set_active_sheet(&self, sheet_id: &str) -> bool {
        self.dispatch(Action::SetActiveSheet {
            sheet_id: sheet_id.into(),
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Locked when the sheet is protected or the key is locked individually.
    /// Unknown sheets report `false`.
    fn is_cell_locked(&self, sheet_id: &str, cell_key: &str) -> bool {
        self.inspect(|doc| doc.sheet(sheet_id).is_some_and(|s| s.is_cell_locked(cell_key)))
            .unwrap_or(false)
    }

    fn is_sheet_protected(&self, sheet_id: &str) -> bool {
        self.inspect(|doc| doc.sheet(sheet_id).is_some_and(|s| s.protected))
            .unwrap_or(false)
    }

    fn active_sheet(&self) -> Option<Sheet> {
        self.inspect(|doc| doc.active_sheet().cloned()).flatten()
    }

    fn active_sheet_id(&self) -> Option<SheetId> {
        self.inspect(|doc| doc.active_sheet().map(|s| s.sheet_id.clone()))
            .flatten()
    }

    /// Check a password against the sheet's stored digest. A protected sheet
    /// without a password accepts nothing.
    fn verify_sheet_password(&self, sheet_id: &str, password: &str) -> bool {
        let digest = hash_password(password);
        self.inspect(|doc| {
            doc.sheet(sheet_id)
                .and_then(|s| s.protection_password.as_deref())
                .is_some_and(|stored| stored == digest)
        })
        .unwrap_or(false)
    }
}

impl DocumentEditor for DocumentStore {
    fn dispatch(&self, action: Action) -> bool {
        DocumentStore::dispatch(self, action)
    }

    fn inspect<R>(&self, f: impl FnOnce(&DocumentState) -> R) -> Option<R> {
        Some(self.read(f))
    }
}

/// Editor used when no store is available. Every call is a logged no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedEditor;

impl DocumentEditor for DetachedEditor {
    fn dispatch(&self, action: Action) -> bool {
        tracing::warn!(action = %action.kind(), "no document store attached; action ignored");
        false
    }

    fn inspect<R>(&self, _f: impl FnOnce(&DocumentState) -> R) -> Option<R> {
        tracing::warn!("no document store attached; query answered with default");
        None
    }
}

/// A possibly-absent store.
#[derive(Debug, Clone, Default)]
pub struct StoreHandle(Option<SharedDocumentStore>);

impl StoreHandle {
    pub fn attached(store: SharedDocumentStore) -> Self {
        Self(Some(store))
    }

    pub fn detached() -> Self {
        Self(None)
    }

    pub fn is_attached(&self) -> bool {
        self.0.is_some()
    }

    pub fn store(&self) -> Option<&SharedDocumentStore> {
        self.0.as_ref()
    }
}

impl From<Option<SharedDocumentStore>> for StoreHandle {
    fn from(store: Option<SharedDocumentStore>) -> Self {
        Self(store)
    }
}

impl DocumentEditor for StoreHandle {
    fn dispatch(&self, action: Action) -> bool {
        match &self.0 {
            Some(store) => store.dispatch(action),
            None => DetachedEditor.dispatch(action),
        }
    }

    fn inspect<R>(&self, f: impl FnOnce(&DocumentState) -> R) -> Option<R> {
        match &self.0 {
            Some(store) => Some(store.read(f)),
            None => DetachedEditor.inspect(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::shared_document_store;
    use cellvault_types::{CellValue, Placement};

    const SHEET: &str = "sheet-1";

    fn attached() -> StoreHandle {
        StoreHandle::attached(shared_document_store(DocumentState::new("t", "amy", 0)))
    }

    #[test]
    fn test_detached_editor_is_inert() {
        let editor = StoreHandle::detached();
        assert!(!editor.is_attached());
        assert!(!editor.update_cell(SHEET, "A1", CellPatch::value("x")));
        assert!(!editor.protect_sheet(SHEET, true, Some("pw")));
        assert!(!editor.is_cell_locked(SHEET, "A1"));
        assert!(!editor.is_sheet_protected(SHEET));
        assert!(editor.active_sheet().is_none());
        assert!(!editor.verify_sheet_password(SHEET, "pw"));
        assert!(!DetachedEditor.lock_cells(SHEET, ["A1"], true));
    }

    #[test]
    fn test_attached_mutators() {
        let editor = attached();
        assert!(editor.update_cell(SHEET, "A1", CellPatch::value(3.0)));
        assert!(editor.add_image(SHEET, ImageObject::new("img-1", "src", Placement::default())));
        assert!(editor.rename_sheet(SHEET, "Budget"));
        assert!(editor.add_sheet(Sheet::new("sheet-2", "Notes")));
        assert!(editor.set_active_sheet("sheet-2"));

        let active = editor.active_sheet().unwrap();
        assert_eq!(active.name, "Notes");
        assert_eq!(editor.active_sheet_id().as_deref(), Some("sheet-2"));

        let value = editor.inspect(|d| d.sheet(SHEET).unwrap().cell("A1").unwrap().value.clone());
        assert_eq!(value, Some(CellValue::Number(3.0)));
    }

    #[test]
    fn test_protection_stores_digest_only() {
        let editor = attached();
        assert!(editor.protect_sheet(SHEET, true, Some("hunter2")));
        assert!(editor.is_sheet_protected(SHEET));
        assert!(editor.is_cell_locked(SHEET, "Z99"));
        assert!(editor.verify_sheet_password(SHEET, "hunter2"));
        assert!(!editor.verify_sheet_password(SHEET, "wrong"));

        let stored = editor
            .inspect(|d| d.sheet(SHEET).unwrap().protection_password.clone())
            .flatten()
            .unwrap();
        assert_ne!(stored, "hunter2");
        assert_eq!(stored, hash_password("hunter2"));
    }

    #[test]
    fn test_cell_locks_without_protection() {
        let editor = attached();
        editor.lock_cells(SHEET, ["A1"], true);
        assert!(editor.is_cell_locked(SHEET, "A1"));
        assert!(!editor.is_cell_locked(SHEET, "A2"));
        assert!(!editor.is_cell_locked("ghost", "A1"));
    }

    #[test]
    fn test_lowercase_keys_reach_stored_cells() {
        let editor = attached();
        editor.lock_cells(SHEET, ["a1"], true);
        assert!(editor.is_cell_locked(SHEET, "a1"));
        assert!(editor.is_cell_locked(SHEET, "A1"));

        assert!(editor.update_cell(SHEET, "b2", CellPatch::value(3.0)));
        let found = editor
            .inspect(|d| d.sheet(SHEET).and_then(|s| s.cell("b2")).cloned())
            .flatten();
        assert_eq!(found.map(|c| c.value), Some(CellValue::Number(3.0)));
    }
}
