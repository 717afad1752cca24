//! SQLite-backed vector store with one collection per session

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource};

use super::similarity::{cosine_similarity, decode_vector, encode_vector};

/// Search result with chunk and similarity
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity, higher is better
    pub similarity: f32,
}

/// Vector store over a single SQLite file
///
/// A collection remembers the dimension of the first vector inserted into it;
/// vectors of any other length are rejected afterwards.
pub struct VectorStore {
    conn: Arc<Mutex<Connection>>,
}

impl VectorStore {
    /// Create or open the database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::vector_db(format!("Failed to open {}: {}", path.display(), e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.migrate()?;
        tracing::debug!("Vector store opened at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.migrate()?;
        Ok(store)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys=ON;
            PRAGMA synchronous=NORMAL;

            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                dimensions INTEGER,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL REFERENCES collections(name) ON DELETE CASCADE,
                document_id TEXT NOT NULL,
                document_hash TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                filename TEXT NOT NULL,
                path TEXT NOT NULL,
                page_number INTEGER,
                page_count INTEGER,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_collection ON chunks(collection);
            CREATE INDEX IF NOT EXISTS idx_chunks_document_hash ON chunks(collection, document_hash);
            "#,
        )?;

        Ok(())
    }

    /// Create a collection if it does not exist yet
    pub fn create_collection(&self, name: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO collections (name, dimensions, created_at) VALUES (?1, NULL, ?2)",
            params![name, chrono::Utc::now()],
        )?;
        Ok(())
    }

    /// Delete a collection and its chunks; returns whether it existed
    pub fn drop_collection(&self, name: &str) -> Result<bool> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM chunks WHERE collection = ?1", params![name])?;
        let removed = tx.execute("DELETE FROM collections WHERE name = ?1", params![name])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    pub fn has_collection(&self, name: &str) -> Result<bool> {
        let conn = self.conn.lock();
        Ok(Self::dimensions_of(&conn, name)?.is_some())
    }

    /// `None` when the collection is missing, `Some(None)` while it is empty
    fn dimensions_of(conn: &Connection, name: &str) -> Result<Option<Option<usize>>> {
        let dims = conn
            .query_row(
                "SELECT dimensions FROM collections WHERE name = ?1",
                params![name],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?;
        Ok(dims.map(|d| d.map(|d| d as usize)))
    }

    /// Insert chunks in one transaction
    pub fn insert_chunks(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let mut dimensions = Self::dimensions_of(&tx, collection)?.ok_or_else(|| {
            Error::vector_db(format!("Collection '{}' not found", collection))
        })?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO chunks (
                    id, collection, document_id, document_hash, chunk_index, content,
                    filename, path, page_number, page_count, embedding, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )?;

            for chunk in chunks {
                if chunk.embedding.is_empty() {
                    return Err(Error::vector_db("Chunk has no embedding"));
                }
                match dimensions {
                    Some(dims) if dims != chunk.embedding.len() => {
                        return Err(Error::vector_db(format!(
                            "Embedding has {} dimensions but collection '{}' stores {}; \
                             was the embedding model changed?",
                            chunk.embedding.len(),
                            collection,
                            dims
                        )));
                    }
                    Some(_) => {}
                    None => dimensions = Some(chunk.embedding.len()),
                }

                stmt.execute(params![
                    chunk.id.to_string(),
                    collection,
                    chunk.document_id.to_string(),
                    chunk.source.document_hash,
                    chunk.chunk_index,
                    chunk.content,
                    chunk.source.filename,
                    chunk.source.path,
                    chunk.source.page_number,
                    chunk.source.page_count,
                    encode_vector(&chunk.embedding),
                    chrono::Utc::now(),
                ])?;
            }
        }

        tx.execute(
            "UPDATE collections SET dimensions = ?1 WHERE name = ?2",
            params![dimensions.map(|d| d as i64), collection],
        )?;
        tx.commit()?;

        tracing::debug!("Inserted {} chunks into '{}'", chunks.len(), collection);
        Ok(())
    }

    /// Exhaustive cosine search over one collection
    pub fn search(&self, collection: &str, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let conn = self.conn.lock();

        let dimensions = Self::dimensions_of(&conn, collection)?.ok_or_else(|| {
            Error::vector_db(format!("Collection '{}' not found", collection))
        })?;

        let Some(dims) = dimensions else {
            return Ok(Vec::new());
        };
        if dims != query.len() {
            return Err(Error::vector_db(format!(
                "Query has {} dimensions but collection '{}' stores {}",
                query.len(),
                collection,
                dims
            )));
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT id, document_id, document_hash, chunk_index, content,
                   filename, path, page_number, page_count, embedding
            FROM chunks WHERE collection = ?1
            "#,
        )?;

        let rows = stmt.query_map(params![collection], |row| {
            let blob: Vec<u8> = row.get(9)?;
            Ok((Self::row_to_chunk(row), blob))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (chunk, blob) = row?;
            let embedding = decode_vector(&blob);
            let similarity = cosine_similarity(query, &embedding);
            results.push(SearchResult {
                chunk: chunk?.with_embedding(embedding),
                similarity,
            });
        }

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(top_k);
        Ok(results)
    }

    fn row_to_chunk(row: &Row<'_>) -> Result<Chunk> {
        let parse_id = |raw: String| {
            Uuid::parse_str(&raw).map_err(|e| Error::vector_db(format!("Bad id '{}': {}", raw, e)))
        };

        Ok(Chunk {
            id: parse_id(row.get(0)?)?,
            document_id: parse_id(row.get(1)?)?,
            content: row.get(4)?,
            embedding: Vec::new(),
            source: ChunkSource {
                filename: row.get(5)?,
                path: row.get(6)?,
                page_number: row.get(7)?,
                page_count: row.get(8)?,
                document_hash: row.get(2)?,
            },
            chunk_index: row.get(3)?,
        })
    }

    /// Number of chunks in a collection
    pub fn count(&self, collection: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Whether the collection holds chunks of the file with this hash
    pub fn contains_document(&self, collection: &str, document_hash: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let found = conn
            .query_row(
                "SELECT 1 FROM chunks WHERE collection = ?1 AND document_hash = ?2 LIMIT 1",
                params![collection, document_hash],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str, embedding: Vec<f32>) -> Chunk {
        let source = ChunkSource {
            filename: "notes.pdf".to_string(),
            path: "notes.pdf".to_string(),
            page_number: Some(1),
            page_count: Some(1),
            document_hash: "hash-1".to_string(),
        };
        Chunk::new(Uuid::new_v4(), content.to_string(), source, 0).with_embedding(embedding)
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let store = VectorStore::in_memory().unwrap();
        store.create_collection("s1").unwrap();
        store
            .insert_chunks(
                "s1",
                &[
                    chunk("north", vec![0.0, 1.0]),
                    chunk("east", vec![1.0, 0.0]),
                    chunk("north-east", vec![0.7, 0.7]),
                ],
            )
            .unwrap();

        let results = store.search("s1", &[1.0, 0.1], 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "east");
        assert_eq!(results[1].chunk.content, "north-east");
        assert!(results[0].similarity > results[1].similarity);
        assert_eq!(results[0].chunk.source.page_number, Some(1));
    }

    #[test]
    fn test_collections_are_isolated() {
        let store = VectorStore::in_memory().unwrap();
        store.create_collection("a").unwrap();
        store.create_collection("b").unwrap();
        store.insert_chunks("a", &[chunk("only in a", vec![1.0, 0.0])]).unwrap();

        assert_eq!(store.count("a").unwrap(), 1);
        assert_eq!(store.count("b").unwrap(), 0);
        assert!(store.search("b", &[1.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_drop_collection() {
        let store = VectorStore::in_memory().unwrap();
        store.create_collection("a").unwrap();
        store.insert_chunks("a", &[chunk("x", vec![1.0])]).unwrap();

        assert!(store.drop_collection("a").unwrap());
        assert!(!store.has_collection("a").unwrap());
        assert_eq!(store.count("a").unwrap(), 0);
        assert!(!store.drop_collection("a").unwrap());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let store = VectorStore::in_memory().unwrap();
        store.create_collection("a").unwrap();
        store.insert_chunks("a", &[chunk("x", vec![1.0, 0.0])]).unwrap();

        let err = store.insert_chunks("a", &[chunk("y", vec![1.0, 0.0, 0.0])]).unwrap_err();
        assert!(matches!(err, Error::VectorDb(_)));
        assert_eq!(store.count("a").unwrap(), 1);

        assert!(store.search("a", &[1.0], 3).is_err());
    }

    #[test]
    fn test_insert_into_missing_collection() {
        let store = VectorStore::in_memory().unwrap();
        let err = store.insert_chunks("ghost", &[chunk("x", vec![1.0])]).unwrap_err();
        assert!(matches!(err, Error::VectorDb(_)));
    }

    #[test]
    fn test_contains_document() {
        let store = VectorStore::in_memory().unwrap();
        store.create_collection("a").unwrap();
        assert!(!store.contains_document("a", "hash-1").unwrap());

        store.insert_chunks("a", &[chunk("x", vec![1.0])]).unwrap();
        assert!(store.contains_document("a", "hash-1").unwrap());
        assert!(!store.contains_document("a", "hash-2").unwrap());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("vectors.db");

        {
            let store = VectorStore::open(&path).unwrap();
            store.create_collection("a").unwrap();
            store.insert_chunks("a", &[chunk("kept", vec![0.5, 0.5])]).unwrap();
        }

        let store = VectorStore::open(&path).unwrap();
        let results = store.search("a", &[0.5, 0.5], 1).unwrap();
        assert_eq!(results[0].chunk.content, "kept");
    }
}
