//! Prompt templates for RAG generation

use crate::providers::llm::ChatMessage;
use crate::providers::vector_store::VectorSearchResult;

/// Exact reply the model is told to give when the context lacks the answer
pub const NO_ANSWER: &str = "I don't know. No relevant information found.";

/// Stands in for the context when retrieval returned nothing
pub const NO_CONTEXT_NOTE: &str = "No relevant context was found in this session's documents.";

/// Prompt builder for session questions
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunk texts with blank lines, best match first
    pub fn build_context(results: &[VectorSearchResult]) -> String {
        if results.is_empty() {
            return NO_CONTEXT_NOTE.to_string();
        }

        results
            .iter()
            .map(|r| r.chunk.content.trim())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// System message: persona, session name and grounding rules
    pub fn build_system_prompt(session: &str) -> String {
        format!(
            r#"You are StudyMate, a helpful educational assistant.
You are answering questions using materials from the following session: {session}.
Treat this as the topic or collection of documents you can use to answer questions.

RULES:
1. Only use the context provided with the question to answer it.
2. If the answer is not in the context, respond exactly:
   "{no_answer}"
3. Do not guess, assume, or add information not present in the context.
4. Provide concise, structured, and easy-to-understand answers.
5. Use bullet points for lists if needed, and keep explanations simple.
6. Do not answer questions beyond the context."#,
            session = session,
            no_answer = NO_ANSWER,
        )
    }

    /// User message carrying the question and its context
    pub fn build_user_prompt(question: &str, context: &str) -> String {
        format!("Question: {}\nContext: {}", question, context)
    }

    /// Full two-message conversation for one question
    pub fn build_messages(
        session: &str,
        question: &str,
        results: &[VectorSearchResult],
    ) -> Vec<ChatMessage> {
        let context = Self::build_context(results);
        vec![
            ChatMessage::system(Self::build_system_prompt(session)),
            ChatMessage::user(Self::build_user_prompt(question, &context)),
        ]
    }
}
