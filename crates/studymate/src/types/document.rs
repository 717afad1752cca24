//! Document and chunk types with source tracking

use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// A PDF that has been ingested into a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// File name shown in sources
    pub filename: String,
    /// Path as supplied by the user
    pub path: String,
    /// SHA-256 of the raw file bytes
    pub content_hash: String,
    /// Total number of pages
    pub total_pages: Option<u32>,
    /// Total number of chunks created
    pub total_chunks: u32,
    /// File size in bytes
    pub file_size: u64,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document for the file at `path`
    pub fn new(path: &Path, content_hash: String, file_size: u64) -> Self {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Self {
            id: Uuid::new_v4(),
            filename,
            path: path.to_string_lossy().to_string(),
            content_hash,
            total_pages: None,
            total_chunks: 0,
            file_size,
            ingested_at: chrono::Utc::now(),
        }
    }
}

/// Where a chunk came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkSource {
    /// File name of the source PDF
    pub filename: String,
    /// Path as supplied at ingestion
    pub path: String,
    /// Page number (1-indexed)
    pub page_number: Option<u32>,
    /// Total pages in document
    pub page_count: Option<u32>,
    /// Hash of the source file, lets re-ingestion be detected
    pub document_hash: String,
}

impl ChunkSource {
    /// Create source info for a page of `doc`
    pub fn page(doc: &Document, page_number: Option<u32>) -> Self {
        Self {
            filename: doc.filename.clone(),
            path: doc.path.clone(),
            page_number,
            page_count: doc.total_pages,
            document_hash: doc.content_hash.clone(),
        }
    }

    /// Format source for display
    pub fn format_citation(&self) -> String {
        match self.page_number {
            Some(page) => format!("{}, Page {}", self.filename, page),
            None => self.filename.clone(),
        }
    }
}

/// A chunk of text from a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Text content
    pub content: String,
    /// Embedding vector, empty until the chunk has been embedded
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
    /// Source information
    pub source: ChunkSource,
    /// Chunk index within document
    pub chunk_index: u32,
}

impl Chunk {
    /// Create a new chunk without an embedding
    pub fn new(document_id: Uuid, content: String, source: ChunkSource, chunk_index: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content,
            embedding: Vec::new(),
            source,
            chunk_index,
        }
    }

    /// Attach the embedding vector
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_filename_from_path() {
        let doc = Document::new(Path::new("notes/week1/lecture.pdf"), "abc".to_string(), 10);
        assert_eq!(doc.filename, "lecture.pdf");
        assert_eq!(doc.path, "notes/week1/lecture.pdf");
    }

    #[test]
    fn test_format_citation() {
        let mut doc = Document::new(Path::new("lecture.pdf"), "abc".to_string(), 10);
        doc.total_pages = Some(3);

        assert_eq!(ChunkSource::page(&doc, Some(2)).format_citation(), "lecture.pdf, Page 2");
        assert_eq!(ChunkSource::page(&doc, None).format_citation(), "lecture.pdf");
    }
}
