//! Ingestion pipeline orchestration: parse, chunk, embed, store

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::StudyMateConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::{Document, IngestReport};

use super::chunker::TextChunker;
use super::parser::PdfParser;

/// Turns PDF files into embedded chunks inside a session collection
pub struct DocumentIngestor {
    parser: PdfParser,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    /// Texts per embedding batch
    batch_size: usize,
}

impl DocumentIngestor {
    /// Create an ingestor from configuration and providers
    pub fn new(
        config: &StudyMateConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Self {
        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)
            .with_min_size(config.chunking.min_chunk_size);

        Self {
            parser: PdfParser::default(),
            chunker,
            embedder,
            store,
            batch_size: config.embeddings.batch_size.max(1),
        }
    }

    /// Ingest one PDF into the collection named `session`
    pub async fn add(&self, session: &str, path: &Path) -> Result<IngestReport> {
        if !self.store.has_collection(session).await? {
            return Err(Error::SessionNotFound(session.to_string()));
        }

        let parser = self.parser.clone();
        let owned_path = path.to_path_buf();
        let (parsed, file_size) = tokio::task::spawn_blocking(move || parser.parse_file(&owned_path))
            .await
            .map_err(|e| Error::internal(format!("Task join error: {}", e)))??;

        let duplicate = self
            .store
            .contains_document(session, &parsed.content_hash)
            .await?;
        if duplicate {
            tracing::warn!(
                "{} is already in session '{}', its chunks will be stored twice",
                path.display(),
                session
            );
        }

        let mut doc = Document::new(path, parsed.content_hash.clone(), file_size);
        doc.total_pages = Some(parsed.total_pages);

        let mut chunks = self.chunker.chunk_document(&doc, &parsed);
        doc.total_chunks = chunks.len() as u32;
        tracing::debug!(
            "{}: {} pages, {} chunks",
            doc.filename,
            parsed.total_pages,
            chunks.len()
        );

        let total_batches = chunks.len().div_ceil(self.batch_size);
        for (batch_num, batch) in chunks.chunks_mut(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            if embeddings.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }
            tracing::debug!("Embedded batch {}/{} of {}", batch_num + 1, total_batches, doc.filename);
        }

        if !chunks.is_empty() {
            self.store.insert(session, &chunks).await?;
        }

        tracing::info!(
            "Ingested {} into '{}' ({} chunks)",
            doc.filename,
            session,
            chunks.len()
        );

        Ok(IngestReport::new(&doc, chunks.len(), duplicate))
    }

    /// Ingest several files in order; a failure is reported for its file and
    /// the remaining files are still processed
    pub async fn add_many(
        &self,
        session: &str,
        paths: &[PathBuf],
    ) -> Vec<(PathBuf, Result<IngestReport>)> {
        let mut outcomes = Vec::with_capacity(paths.len());

        for path in paths {
            let outcome = self.add(session, path).await;
            if let Err(e) = &outcome {
                tracing::warn!("Failed to ingest {}: {}", path.display(), e);
            }
            outcomes.push((path.clone(), outcome));
        }

        outcomes
    }
}
