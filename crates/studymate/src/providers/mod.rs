//! Provider abstractions for embeddings, chat completion, and vector storage
//!
//! The assistant only talks to these traits, so backends can be swapped
//! (tests use in-process fakes).

pub mod embedding;
pub mod groq;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use groq::GroqClient;
pub use llm::{ChatMessage, LlmProvider, Role};
pub use local::LocalVectorStore;
pub use ollama::OllamaEmbedder;
pub use vector_store::{VectorSearchResult, VectorStoreProvider};
