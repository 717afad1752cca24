//! Vector storage and similarity search

pub mod similarity;
mod store;

pub use similarity::{cosine_similarity, decode_vector, encode_vector};
pub use store::{SearchResult, VectorStore};
