//! Local vector store provider
//!
//! Wraps the SQLite `VectorStore`; every call runs on the blocking pool.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::retrieval::VectorStore;
use crate::types::Chunk;

use super::vector_store::{VectorSearchResult, VectorStoreProvider};

/// Local vector store backed by a SQLite file
pub struct LocalVectorStore {
    store: Arc<VectorStore>,
}

impl LocalVectorStore {
    /// Create from existing VectorStore
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }

    /// Open (or create) the database file at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let store = Arc::new(VectorStore::open(path)?);
        Ok(Self { store })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&VectorStore) -> Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn create_collection(&self, collection: &str) -> Result<()> {
        let name = collection.to_string();
        self.blocking(move |store| store.create_collection(&name)).await
    }

    async fn drop_collection(&self, collection: &str) -> Result<bool> {
        let name = collection.to_string();
        self.blocking(move |store| store.drop_collection(&name)).await
    }

    async fn has_collection(&self, collection: &str) -> Result<bool> {
        let name = collection.to_string();
        self.blocking(move |store| store.has_collection(&name)).await
    }

    async fn insert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let name = collection.to_string();
        let chunks = chunks.to_vec();
        self.blocking(move |store| store.insert_chunks(&name, &chunks)).await
    }

    async fn query(
        &self,
        collection: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>> {
        let name = collection.to_string();
        let query = query_embedding.to_vec();

        let results = self
            .blocking(move |store| store.search(&name, &query, top_k))
            .await?;

        Ok(results
            .into_iter()
            .map(|r| VectorSearchResult {
                chunk: r.chunk,
                similarity: r.similarity,
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let name = collection.to_string();
        self.blocking(move |store| store.count(&name)).await
    }

    async fn contains_document(&self, collection: &str, document_hash: &str) -> Result<bool> {
        let name = collection.to_string();
        let hash = document_hash.to_string();
        self.blocking(move |store| store.contains_document(&name, &hash)).await
    }

    fn name(&self) -> &str {
        "local-sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkSource;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_round_trip_through_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalVectorStore::open(&dir.path().join("vectors.db")).unwrap();

        provider.create_collection("s1").await.unwrap();
        provider.create_collection("s1").await.unwrap();
        assert!(provider.has_collection("s1").await.unwrap());

        let source = ChunkSource {
            filename: "a.pdf".to_string(),
            path: "a.pdf".to_string(),
            page_number: None,
            page_count: None,
            document_hash: "h".to_string(),
        };
        let chunk = Chunk::new(Uuid::new_v4(), "text".to_string(), source, 0)
            .with_embedding(vec![0.3, 0.4]);
        provider.insert("s1", &[chunk]).await.unwrap();

        assert_eq!(provider.count("s1").await.unwrap(), 1);
        let hits = provider.query("s1", &[0.3, 0.4], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].similarity - 1.0).abs() < 1e-5);

        assert!(provider.drop_collection("s1").await.unwrap());
        assert!(!provider.has_collection("s1").await.unwrap());
    }
}
