//! Persistence gateway: documents to and from content storage.
//!
//! A save encodes the current document, uploads it, and then records a
//! version-history entry through the normal dispatch path. A load fetches,
//! decodes and validates a document, then replaces the store's state with
//! it. Either way, a failure leaves the store untouched.
//!
//! Saves and loads through one gateway are serialized by an in-flight lock.
//! A save whose document was replaced while its upload was running (detected
//! by the store's generation counter) skips the history append.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use cellvault_cas::{CasError, ContentId, ContentStore};
use cellvault_types::{DocumentState, ValidationError, VersionEntry, validate_document};

use crate::action::Action;
use crate::projection::{UnifiedSheet, project_sheet};
use crate::store::SharedDocumentStore;

/// Author recorded when the document has no owner and no fallback is set.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Errors from saving, loading or exporting.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("content store error: {0}")]
    Store(#[from] CasError),

    #[error("document encoding error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("invalid document: {0}")]
    Invalid(#[from] ValidationError),

    #[error("sheet not found: {0}")]
    SheetNotFound(String),
}

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Byte encoding of documents.
///
/// JSON with the schema's field names. Maps are ordered, so a document always
/// encodes to the same bytes and therefore the same content id.
pub struct DocumentCodec;

impl DocumentCodec {
    pub fn encode(doc: &DocumentState) -> PersistResult<Vec<u8>> {
        Ok(serde_json::to_vec(doc)?)
    }

    /// Decode and validate.
    pub fn decode(bytes: &[u8]) -> PersistResult<DocumentState> {
        let doc: DocumentState = serde_json::from_slice(bytes)?;
        validate_document(&doc)?;
        Ok(doc)
    }
}

/// Outcome of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveReceipt {
    pub content_id: ContentId,
    /// Whether a version-history entry was appended. `false` when the
    /// document was replaced while the upload was in flight.
    pub recorded: bool,
}

/// Moves one store's document in and out of a content store.
pub struct PersistenceGateway {
    store: SharedDocumentStore,
    content: Arc<dyn ContentStore>,
    in_flight: Mutex<()>,
    author_fallback: Option<String>,
}

impl PersistenceGateway {
    pub fn new(store: SharedDocumentStore, content: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            content,
            in_flight: Mutex::new(()),
            author_fallback: None,
        }
    }

    /// Author used for version entries when the document owner is empty.
    pub fn with_author_fallback(mut self, author: impl Into<String>) -> Self {
        self.author_fallback = Some(author.into());
        self
    }

    pub fn store(&self) -> &SharedDocumentStore {
        &self.store
    }

    pub fn content_store(&self) -> &Arc<dyn ContentStore> {
        &self.content
    }

    /// Save the current document and record the version.
    pub async fn save(&self) -> PersistResult<SaveReceipt> {
        self.save_inner(None).await
    }

    /// Save with a description attached to the version entry.
    pub async fn save_with_description(
        &self,
        description: impl Into<String>,
    ) -> PersistResult<SaveReceipt> {
        self.save_inner(Some(description.into())).await
    }

    async fn save_inner(&self, description: Option<String>) -> PersistResult<SaveReceipt> {
        let _guard = self.in_flight.lock().await;

        let (doc, generation) = self.store.snapshot_with_generation();
        let bytes = DocumentCodec::encode(&doc)?;
        let content_id = self.content.put(&bytes).await?;

        let entry = VersionEntry {
            content_id: content_id.to_string(),
            timestamp: self.store.now(),
            author: self.author_for(&doc),
            description,
        };
        let recorded = match self
            .store
            .dispatch_if_generation(generation, Action::RecordVersion { entry })
        {
            Some(recorded) => recorded,
            None => {
                tracing::warn!(
                    cid = %content_id,
                    "document replaced during save; version entry discarded"
                );
                false
            }
        };

        if recorded {
            tracing::info!(
                cid = %content_id,
                document = %doc.document_id,
                bytes = bytes.len(),
                "saved document"
            );
        }
        Ok(SaveReceipt {
            content_id,
            recorded,
        })
    }

    /// Fetch a document and make it the store's state.
    pub async fn load(&self, content_id: &ContentId) -> PersistResult<DocumentState> {
        let _guard = self.in_flight.lock().await;

        let doc = self.fetch(content_id).await?;
        self.store.dispatch(Action::RestoreFromIpfs(Box::new(doc.clone())));
        tracing::info!(cid = %content_id, document = %doc.document_id, "loaded document");
        Ok(doc)
    }

    /// Load `content_id` to keep editing it.
    ///
    /// A stored snapshot never lists itself in its own history, so after the
    /// load the loaded id is appended as the newest version entry unless it
    /// already is. The next save then chains onto it.
    pub async fn checkout(&self, content_id: &ContentId) -> PersistResult<DocumentState> {
        let _guard = self.in_flight.lock().await;

        let doc = self.fetch(content_id).await?;
        self.store.dispatch(Action::RestoreFromIpfs(Box::new(doc.clone())));
        let listed = doc
            .latest_version()
            .is_some_and(|v| v.content_id == content_id.as_str());
        if !listed {
            let entry = VersionEntry {
                content_id: content_id.to_string(),
                timestamp: doc.metadata.updated_at,
                author: self.author_for(&doc),
                description: None,
            };
            self.store.dispatch(Action::RecordVersion { entry });
        }
        tracing::info!(cid = %content_id, document = %doc.document_id, "checked out document");
        Ok(doc)
    }

    /// Fetch and decode a document without touching the store.
    pub async fn fetch(&self, content_id: &ContentId) -> PersistResult<DocumentState> {
        let bytes = self.content.get(content_id).await?;
        DocumentCodec::decode(&bytes)
    }

    /// Upload the unified projection of one sheet. Version history is not
    /// affected.
    pub async fn export_unified(&self, sheet_id: &str) -> PersistResult<ContentId> {
        let sheet = self
            .store
            .read(|doc| doc.sheet(sheet_id).cloned())
            .ok_or_else(|| PersistError::SheetNotFound(sheet_id.to_string()))?;
        let unified = UnifiedSheet {
            sheet_id: sheet.sheet_id.clone(),
            name: sheet.name.clone(),
            cells: project_sheet(&sheet),
        };
        let bytes = serde_json::to_vec(&unified)?;
        let content_id = self.content.put(&bytes).await?;
        tracing::info!(cid = %content_id, sheet = %sheet_id, cells = unified.cells.len(), "exported sheet");
        Ok(content_id)
    }

    fn author_for(&self, doc: &DocumentState) -> String {
        if !doc.metadata.owner.is_empty() {
            return doc.metadata.owner.clone();
        }
        self.author_fallback
            .clone()
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
    }
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("store", &self.store)
            .field("author_fallback", &self.author_fallback)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::CellPatch;
    use crate::editor::DocumentEditor;
    use crate::store::shared_document_store;
    use cellvault_cas::MemoryStore;

    fn gateway(owner: &str) -> PersistenceGateway {
        gateway_over(owner, Arc::new(MemoryStore::new()))
    }

    fn gateway_over(owner: &str, content: Arc<dyn ContentStore>) -> PersistenceGateway {
        let store = shared_document_store(DocumentState::new("Budget", owner, 0));
        PersistenceGateway::new(store, content)
    }

    #[test]
    fn test_codec_is_canonical() {
        let doc = DocumentState::new("t", "o", 1);
        assert_eq!(DocumentCodec::encode(&doc).unwrap(), DocumentCodec::encode(&doc.clone()).unwrap());
    }

    #[test]
    fn test_decode_rejects_invalid_documents() {
        let mut doc = DocumentState::new("t", "o", 1);
        doc.metadata.sheet_count = 7;
        let bytes = serde_json::to_vec(&doc).unwrap();
        assert!(matches!(DocumentCodec::decode(&bytes), Err(PersistError::Invalid(_))));
        assert!(matches!(DocumentCodec::decode(b"{not json"), Err(PersistError::Codec(_))));
    }

    #[tokio::test]
    async fn test_save_records_version() {
        let gw = gateway("amy");
        let receipt = gw.save_with_description("first").await.unwrap();
        assert!(receipt.recorded);

        let history = gw.store().read(|d| d.version_history.clone());
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content_id, receipt.content_id.to_string());
        assert_eq!(history[0].author, "amy");
        assert_eq!(history[0].description.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_author_fallback() {
        let gw = gateway("").with_author_fallback("ops");
        gw.save().await.unwrap();
        assert_eq!(gw.store().read(|d| d.version_history[0].author.clone()), "ops");

        let anon = gateway("");
        anon.save().await.unwrap();
        assert_eq!(anon.store().read(|d| d.version_history[0].author.clone()), UNKNOWN_AUTHOR);
    }

    #[tokio::test]
    async fn test_load_replaces_state() {
        let gw = gateway("amy");
        gw.store().update_cell("sheet-1", "A1", CellPatch::value("saved"));
        let saved = gw.store().snapshot();
        let receipt = gw.save().await.unwrap();

        gw.store().update_cell("sheet-1", "A1", CellPatch::value("later"));
        let loaded = gw.load(&receipt.content_id).await.unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(gw.store().snapshot(), saved);
        assert_eq!(gw.store().generation(), 1);
    }

    #[test]
    fn test_codec_keeps_every_float_bit() {
        let values = [
            1.0715660391465826e-75,
            0.1 + 0.2,
            2.2250738585072014e-308,
            5e-324,
            f64::MAX,
            f64::MIN_POSITIVE,
            -9007199254740993.0,
            123456.78901234567,
            1e300 / 7.0,
        ];
        let mut doc = DocumentState::new("t", "o", 1);
        doc.sheets[0].grid.row_count = values.len() as u32;
        for (i, v) in values.iter().enumerate() {
            doc.sheets[0]
                .cells
                .insert(format!("A{}", i + 1), cellvault_types::CellData::with_value(*v));
            doc.sheets[0].grid.row_sizes.insert(i as u32, v.abs());
        }
        let back = DocumentCodec::decode(&DocumentCodec::encode(&doc).unwrap()).unwrap();
        for (i, v) in values.iter().enumerate() {
            let cell = back.sheets[0].cell(&format!("A{}", i + 1)).unwrap();
            match cell.value {
                cellvault_types::CellValue::Number(n) => assert_eq!(n.to_bits(), v.to_bits()),
                ref other => panic!("expected a number, got {other:?}"),
            }
        }
        assert_eq!(back, doc);
    }

    #[test]
    fn test_decode_rejects_huge_merge_span() {
        let mut doc = DocumentState::new("t", "o", 1);
        doc.sheets[0].cells.insert(
            "B2".into(),
            cellvault_types::CellData {
                is_merge_parent: true,
                merge_span: Some(cellvault_types::MergeSpan { rows: u32::MAX, cols: 1 }),
                ..Default::default()
            },
        );
        let bytes = serde_json::to_vec(&doc).unwrap();
        assert!(matches!(DocumentCodec::decode(&bytes), Err(PersistError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_checkout_lists_loaded_version() {
        let gw = gateway("amy");
        let first = gw.save().await.unwrap();

        let other = gateway_over("bob", gw.content_store().clone());
        let doc = other.checkout(&first.content_id).await.unwrap();
        assert!(doc.version_history.is_empty());
        let history = other.store().read(|d| d.version_history.clone());
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content_id, first.content_id.to_string());
        assert_eq!(history[0].author, "amy");

        // The next save chains onto the checked-out version.
        let second = other.save().await.unwrap();
        let third = gateway_over("cy", gw.content_store().clone());
        third.checkout(&second.content_id).await.unwrap();
        let ids: Vec<String> = third
            .store()
            .read(|d| d.version_history.iter().map(|v| v.content_id.clone()).collect());
        assert_eq!(ids, vec![first.content_id.to_string(), second.content_id.to_string()]);
    }

    #[tokio::test]
    async fn test_load_missing_leaves_state() {
        let gw = gateway("amy");
        let before = gw.store().snapshot();
        let missing = ContentId::for_bytes(b"nothing here");
        assert!(matches!(gw.load(&missing).await, Err(PersistError::Store(CasError::NotFound(_)))));
        assert_eq!(gw.store().snapshot(), before);
    }

    #[tokio::test]
    async fn test_export_unified() {
        let gw = gateway("amy");
        gw.store().update_cell("sheet-1", "B3", CellPatch::value(9.0));
        let cid = gw.export_unified("sheet-1").await.unwrap();
        let bytes = gw.content_store().get(&cid).await.unwrap();
        let unified: UnifiedSheet = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(unified.cells.len(), 1);
        assert_eq!(unified.cells[0].col, "B");
        assert_eq!(unified.cells[0].row, 3);
        assert!(gw.store().read(|d| d.version_history.is_empty()));

        assert!(matches!(gw.export_unified("nope").await, Err(PersistError::SheetNotFound(_))));
    }
}
