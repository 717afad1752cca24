//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use crate::error::Result;
use crate::types::Chunk;

/// Search result from vector store
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub similarity: f32,
}

/// Trait for per-session vector collections
///
/// Implementations:
/// - `LocalVectorStore`: SQLite file with exhaustive cosine search
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Create a collection; creating an existing one is a no-op
    async fn create_collection(&self, collection: &str) -> Result<()>;

    /// Drop a collection with all its chunks; returns whether it existed
    async fn drop_collection(&self, collection: &str) -> Result<bool>;

    /// Check if a collection exists
    async fn has_collection(&self, collection: &str) -> Result<bool>;

    /// Insert embedded chunks
    async fn insert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// The `top_k` nearest chunks, most similar first
    async fn query(
        &self,
        collection: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>>;

    /// Number of chunks in a collection
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Whether chunks of the file with this hash are already stored
    async fn contains_document(&self, collection: &str, document_hash: &str) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
