//! StudyMate: chat with your PDFs from the terminal
//!
//! PDFs are split into chunks, embedded with a local Ollama model and stored
//! per study session in a SQLite vector store. Questions are answered by a
//! hosted chat model that only sees the chunks retrieved for them.

pub mod app;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod session;
pub mod types;

pub use app::StudyMate;
pub use config::StudyMateConfig;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, ChunkSource, Document},
    response::{ChatAnswer, Citation, IngestReport},
};
