//! Document state container for cellvault.
//!
//! A [`DocumentStore`] holds one spreadsheet document and changes it only
//! through [`Action`]s run by the pure [`reducer`]. Around it:
//!
//! - [`PersistenceGateway`] saves snapshots to a [`ContentStore`] and loads
//!   them back, appending to the document's version history
//! - [`AutoSaver`] saves after the document has been quiet for a while
//! - [`DocumentEditor`] gives named mutators and queries over any store
//! - [`project_sheet`] flattens cells for export writers
//! - [`apply_live_edits`] takes batches from live grid components
//!
//! # Data Flow
//!
//! ```text
//! UI / sync ──Action──▶ DocumentStore ──StoreEvent──▶ AutoSaver
//!                          │    ▲                         │
//!                  snapshot│    │RECORD_VERSION           │save()
//!                          ▼    │                         ▼
//!                       PersistenceGateway ◀──────────────┘
//!                          │    ▲
//!                       put│    │get
//!                          ▼    │
//!                       ContentStore
//! ```
//!
//! [`ContentStore`]: cellvault_cas::ContentStore

pub mod action;
pub mod autosave;
pub mod config;
pub mod editor;
pub mod persistence;
pub mod projection;
pub mod reducer;
pub mod store;
pub mod sync;

pub use action::{
    Action, ActionKind, CellPatch, GridConfigPatch, MetadataPatch, ObjectPatch, SettingsPatch,
};
pub use autosave::{AutoSaveConfig, AutoSaveHandle, AutoSaver};
pub use config::{ConfigError, StoreConfig};
pub use editor::{DetachedEditor, DocumentEditor, StoreHandle, hash_password};
pub use persistence::{
    DocumentCodec, PersistError, PersistResult, PersistenceGateway, SaveReceipt,
};
pub use projection::{
    UnifiedCell, UnifiedMeta, UnifiedSheet, UnifiedType, project_document, project_sheet,
};
pub use reducer::{apply, reduce};
pub use store::{
    Clock, DocumentStore, ManualClock, SharedDocumentStore, StoreEvent, SystemClock,
    shared_document_store,
};
pub use sync::{LiveCellEdit, apply_live_edits};
