//! Core types

pub mod document;
pub mod response;

pub use document::{Chunk, ChunkSource, Document};
pub use response::{ChatAnswer, Citation, IngestReport};
