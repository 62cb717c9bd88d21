//! Remote dataset storage with optimistic concurrency.

use std::collections::HashMap;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use linkcatalog_shared::{LinkCatalogError, Result};

/// A document read from a [`DatasetStore`], together with the revision token
/// that must accompany the next write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    pub content: Vec<u8>,
    pub revision: String,
}

/// A revisioned document store.
///
/// `write` succeeds only if `revision` still identifies the stored document;
/// otherwise it fails with [`LinkCatalogError::RevisionConflict`] and leaves
/// the document untouched.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn read(&self, path: &str) -> Result<RemoteDocument>;

    /// Replace the document at `path`. Returns the new revision.
    async fn write(&self, path: &str, content: &[u8], revision: &str, message: &str)
    -> Result<String>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process [`DatasetStore`]. The revision of a document is the hex
/// SHA-256 of its bytes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Vec<u8>>>,
    messages: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one document.
    pub fn with_document(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            documents: Mutex::new(HashMap::from([(path.into(), content.into())])),
            messages: Mutex::default(),
        }
    }

    /// Current bytes at `path`.
    pub async fn document(&self, path: &str) -> Option<Vec<u8>> {
        self.documents.lock().await.get(path).cloned()
    }

    /// Change descriptions of every accepted write, oldest first.
    pub async fn messages(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }
}

/// Revision token for `content`.
pub fn content_revision(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

#[async_trait]
impl DatasetStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<RemoteDocument> {
        let docs = self.documents.lock().await;
        let content = docs
            .get(path)
            .cloned()
            .ok_or_else(|| LinkCatalogError::Persistence(format!("{path}: not found")))?;
        Ok(RemoteDocument {
            revision: content_revision(&content),
            content,
        })
    }

    async fn write(
        &self,
        path: &str,
        content: &[u8],
        revision: &str,
        message: &str,
    ) -> Result<String> {
        let mut docs = self.documents.lock().await;
        let current = docs
            .get(path)
            .ok_or_else(|| LinkCatalogError::Persistence(format!("{path}: not found")))?;

        if content_revision(current) != revision {
            return Err(LinkCatalogError::RevisionConflict { path: path.into() });
        }

        docs.insert(path.into(), content.to_vec());
        self.messages.lock().await.push(message.into());
        Ok(content_revision(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_with_current_revision() {
        let store = MemoryStore::with_document("data.json", "{}");
        let doc = store.read("data.json").await.unwrap();
        assert_eq!(doc.revision, content_revision(b"{}"));

        let new_revision = store
            .write("data.json", b"{\"a\":1}", &doc.revision, "update")
            .await
            .unwrap();

        assert_eq!(new_revision, content_revision(b"{\"a\":1}"));
        assert_eq!(store.document("data.json").await.unwrap(), b"{\"a\":1}");
        assert_eq!(store.messages().await, vec!["update".to_string()]);
    }

    #[tokio::test]
    async fn stale_revision_conflicts() {
        let store = MemoryStore::with_document("data.json", "{}");
        let stale = store.read("data.json").await.unwrap();

        store
            .write("data.json", b"[1]", &stale.revision, "first")
            .await
            .unwrap();
        let err = store
            .write("data.json", b"[2]", &stale.revision, "second")
            .await
            .unwrap_err();

        assert!(matches!(err, LinkCatalogError::RevisionConflict { .. }));
        assert_eq!(store.document("data.json").await.unwrap(), b"[1]");
        assert_eq!(store.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn missing_document() {
        let store = MemoryStore::new();
        assert!(store.read("nope.json").await.unwrap_err().is_persistence());
        assert!(
            store
                .write("nope.json", b"{}", "x", "m")
                .await
                .unwrap_err()
                .is_persistence()
        );
    }
}
