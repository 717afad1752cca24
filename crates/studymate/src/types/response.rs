//! Response types for chat and ingestion

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{Chunk, Document};

/// A retrieved chunk that was handed to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// Chunk ID
    pub chunk_id: Uuid,
    /// Source filename
    pub filename: String,
    /// Page number (if known)
    pub page_number: Option<u32>,
    /// Cosine similarity to the question
    pub similarity_score: f32,
}

impl Citation {
    /// Create a citation from a chunk and similarity score
    pub fn from_chunk(chunk: &Chunk, similarity_score: f32) -> Self {
        Self {
            chunk_id: chunk.id,
            filename: chunk.source.filename.clone(),
            page_number: chunk.source.page_number,
            similarity_score,
        }
    }

    /// Format citation for display in text
    pub fn format_inline(&self) -> String {
        match self.page_number {
            Some(page) => format!("{}, Page {} ({:.2})", self.filename, page, self.similarity_score),
            None => format!("{} ({:.2})", self.filename, self.similarity_score),
        }
    }
}

/// Answer to one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    /// Model output, unmodified
    pub answer: String,
    /// Chunks the answer was conditioned on, best first
    pub citations: Vec<Citation>,
    /// Model that produced the answer
    pub model: String,
}

impl ChatAnswer {
    /// Whether retrieval found nothing for the question
    pub fn had_context(&self) -> bool {
        !self.citations.is_empty()
    }
}

/// Outcome of ingesting one PDF
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Document ID shared by all chunks
    pub document_id: Uuid,
    /// Source filename
    pub filename: String,
    /// Pages read from the file
    pub pages: u32,
    /// Chunks written to the collection
    pub chunks: usize,
    /// The same file was already in the collection
    pub duplicate: bool,
}

impl IngestReport {
    /// Build a report for an ingested document
    pub fn new(doc: &Document, chunks: usize, duplicate: bool) -> Self {
        Self {
            document_id: doc.id,
            filename: doc.filename.clone(),
            pages: doc.total_pages.unwrap_or(0),
            chunks,
            duplicate,
        }
    }
}
