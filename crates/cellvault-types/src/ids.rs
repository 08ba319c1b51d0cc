//! Identifiers for documents, sheets, and sheet-scoped objects.
//!
//! `DocumentId` wraps a UUIDv7 (time-ordered, globally unique) and is
//! transparent on the wire. Sheet ids, object ids and cell keys are plain
//! strings: they are produced by UI collaborators as often as by this crate,
//! and the persisted format treats them as opaque text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sheet identifier, unique within a document and immutable once assigned.
pub type SheetId = String;

/// Spreadsheet-style cell coordinate (`"A1"`), unique within a sheet.
pub type CellKey = String;

/// Identifier of an image, shape, chart, link, symbol or conditional format,
/// unique within its collection on one sheet.
pub type ObjectId = String;

/// A document identifier (UUIDv7).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(uuid::Uuid);

impl DocumentId {
    /// Create a new time-ordered ID (UUIDv7).
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// First 8 hex characters, for display only.
    pub fn short(&self) -> String {
        self.0.as_simple().to_string()[..8].to_string()
    }

    /// Full 32-character hex string (no hyphens).
    pub fn to_hex(&self) -> String {
        self.0.as_simple().to_string()
    }

    /// Parse from a hex string (32 chars, no hyphens) or standard UUID format.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        uuid::Uuid::parse_str(s).map(Self)
    }

    /// A nil ID, used as a sentinel.
    pub fn nil() -> Self {
        Self(uuid::Uuid::nil())
    }

    /// Check if this is the nil ID.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for DocumentId {
    fn from(u: uuid::Uuid) -> Self {
        Self(u)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.short())
    }
}

/// Generate a fresh object id of the form `"{prefix}-{8 hex}"`.
///
/// The suffix comes from a UUIDv7's random tail, so ids minted in the same
/// millisecond still differ.
pub fn new_object_id(prefix: &str) -> ObjectId {
    let simple = uuid::Uuid::now_v7().as_simple().to_string();
    format!("{}-{}", prefix, &simple[simple.len() - 8..])
}
