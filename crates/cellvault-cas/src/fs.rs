//! On-disk content store.
//!
//! Objects live at `root/<first 2 hex>/<remaining 62 hex>`. Writes land in
//! a temp file next to the target and are renamed into place, so a reader
//! never sees a half-written object.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;

use crate::{CasError, CasResult, ContentId, ContentStore};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Sharded object directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open (or lazily create) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the object for `id` lives.
    fn object_path(&self, id: &ContentId) -> CasResult<PathBuf> {
        let hex = id
            .blake3_hex()
            .ok_or_else(|| CasError::InvalidId(id.to_string()))?;
        let (shard, rest) = hex.split_at(2);
        Ok(self.root.join(shard).join(rest))
    }

    fn temp_path(target: &Path) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut name = target
            .file_name()
            .map(|s| s.to_os_string())
            .unwrap_or_default();
        name.push(format!(".tmp-{}-{n}", std::process::id()));
        target.with_file_name(name)
    }
}

#[async_trait]
impl ContentStore for FsStore {
    async fn put(&self, bytes: &[u8]) -> CasResult<ContentId> {
        let id = ContentId::for_bytes(bytes);
        let path = self.object_path(&id)?;

        if fs::try_exists(&path).await? {
            tracing::debug!(cid = %id.short(), "object already stored");
            return Ok(id);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let temp = Self::temp_path(&path);
        if let Err(e) = fs::write(&temp, bytes).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        tracing::debug!(cid = %id.short(), bytes = bytes.len(), "stored object");
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> CasResult<Vec<u8>> {
        let path = self.object_path(id)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CasError::NotFound(id.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let actual = ContentId::for_bytes(&bytes);
        if actual != *id {
            tracing::warn!(expected = %id, actual = %actual, "object failed hash check");
            return Err(CasError::Corrupted {
                expected: id.clone(),
                actual,
            });
        }
        Ok(bytes)
    }

    async fn contains(&self, id: &ContentId) -> CasResult<bool> {
        let path = self.object_path(id)?;
        Ok(fs::try_exists(&path).await?)
    }
}
