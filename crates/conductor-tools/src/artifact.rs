//! Artifact store boundary
//!
//! Capabilities persist their outputs here and hand back opaque URIs.
//! The engine only ever passes those URIs around; it never dereferences them.

use crate::error::{Error, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Blob store for execution artifacts
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store bytes and return their URI
    async fn put(&self, bytes: Vec<u8>) -> Result<String>;

    /// Fetch the bytes behind a URI
    async fn get(&self, uri: &str) -> Result<Vec<u8>>;
}

/// In-process, content-addressed artifact store.
///
/// URIs have the form `mem://artifacts/<sha256>`, so identical payloads map to
/// identical URIs and deterministic capabilities yield deterministic artifacts.
pub struct MemoryArtifactStore {
    blobs: DashMap<String, Vec<u8>>,
    scheme: String,
}

impl Default for MemoryArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryArtifactStore {
    /// Create an empty store using the `mem` scheme
    #[must_use]
    pub fn new() -> Self {
        Self::with_scheme("mem")
    }

    /// Create an empty store with a custom URI scheme
    #[must_use]
    pub fn with_scheme(scheme: impl Into<String>) -> Self {
        Self {
            blobs: DashMap::new(),
            scheme: scheme.into(),
        }
    }

    /// Number of stored artifacts
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    fn uri_for(&self, bytes: &[u8]) -> String {
        format!("{}://artifacts/{:x}", self.scheme, Sha256::digest(bytes))
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<String> {
        let uri = self.uri_for(&bytes);
        debug!(uri = %uri, size = bytes.len(), "Storing artifact");
        self.blobs.insert(uri.clone(), bytes);
        Ok(uri)
    }

    async fn get(&self, uri: &str) -> Result<Vec<u8>> {
        self.blobs
            .get(uri)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::ArtifactNotFound(uri.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let store = MemoryArtifactStore::new();
        let uri = store.put(b"hello".to_vec()).await.unwrap();

        assert!(uri.starts_with("mem://artifacts/"));
        assert_eq!(store.get(&uri).await.unwrap(), b"hello".to_vec());
    }

    #[tokio::test]
    async fn test_content_addressed() {
        let store = MemoryArtifactStore::new();
        let a = store.put(b"same".to_vec()).await.unwrap();
        let b = store.put(b"same".to_vec()).await.unwrap();
        let c = store.put(b"other".to_vec()).await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_scheme_is_used_in_uri() {
        let store = MemoryArtifactStore::with_scheme("minio");
        let uri = tokio_test::block_on(store.put(b"report".to_vec())).unwrap();
        assert!(uri.starts_with("minio://artifacts/"));
    }

    #[tokio::test]
    async fn test_missing_artifact() {
        let store = MemoryArtifactStore::with_scheme("minio");
        let err = store.get("minio://artifacts/nope").await.unwrap_err();
        assert!(matches!(err, Error::ArtifactNotFound(_)));
    }
}
