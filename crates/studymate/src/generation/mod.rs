//! Prompt assembly for grounded answers

pub mod prompt;

pub use prompt::{PromptBuilder, NO_ANSWER, NO_CONTEXT_NOTE};
