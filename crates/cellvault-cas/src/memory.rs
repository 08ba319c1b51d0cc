//! In-memory content store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{CasError, CasResult, ContentId, ContentStore};

/// In-memory content store.
///
/// Thread-safe via internal `RwLock`. All data is lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<ContentId, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct objects stored.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn put(&self, bytes: &[u8]) -> CasResult<ContentId> {
        let id = ContentId::for_bytes(bytes);
        self.objects
            .write()
            .entry(id.clone())
            .or_insert_with(|| bytes.to_vec());
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> CasResult<Vec<u8>> {
        self.objects
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| CasError::NotFound(id.clone()))
    }

    async fn contains(&self, id: &ContentId) -> CasResult<bool> {
        Ok(self.objects.read().contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let store = MemoryStore::new();
        let id = store.put(b"hello world").await.unwrap();
        assert_eq!(store.get(&id).await.unwrap(), b"hello world");
        assert!(store.contains(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_identical_content_stored_once() {
        let store = MemoryStore::new();
        let a = store.put(b"same").await.unwrap();
        let b = store.put(b"same").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_missing() {
        let store = MemoryStore::new();
        let id = ContentId::for_bytes(b"never stored");
        assert!(matches!(store.get(&id).await, Err(CasError::NotFound(_))));
        assert!(!store.contains(&id).await.unwrap());
        assert!(store.is_empty());
    }
}
