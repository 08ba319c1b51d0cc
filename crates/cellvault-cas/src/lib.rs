//! Content-addressed storage for cellvault.
//!
//! Documents are persisted as immutable blobs keyed by a digest of their
//! bytes. The [`ContentStore`] trait is the whole boundary: `put` returns an
//! id, `get` returns the bytes. Identical content always maps to the same id.
//!
//! - [`MemoryStore`] - ephemeral map, for tests and embedding hosts
//! - [`FsStore`] - sharded on-disk object directory

mod cid;
mod error;
mod fs;
mod memory;

use async_trait::async_trait;

pub use cid::{BLAKE3_PREFIX, ContentId};
pub use error::{CasError, CasResult};
pub use fs::FsStore;
pub use memory::MemoryStore;

/// Content-addressed blob storage.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `bytes` and return their id. Storing the same bytes twice
    /// returns the same id.
    async fn put(&self, bytes: &[u8]) -> CasResult<ContentId>;

    /// Fetch the bytes stored under `id`.
    async fn get(&self, id: &ContentId) -> CasResult<Vec<u8>>;

    /// Check whether `id` is stored.
    async fn contains(&self, id: &ContentId) -> CasResult<bool> {
        match self.get(id).await {
            Ok(_) => Ok(true),
            Err(CasError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
