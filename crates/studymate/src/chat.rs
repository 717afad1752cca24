//! Retrieval-augmented question answering over one session

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::{EmbeddingProvider, LlmProvider, VectorStoreProvider};
use crate::types::{ChatAnswer, Citation};

/// Embeds questions, retrieves context and asks the model
pub struct RagAssistant {
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    store: Arc<dyn VectorStoreProvider>,
    /// Chunks retrieved per question
    top_k: usize,
}

impl RagAssistant {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn VectorStoreProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            llm,
            store,
            top_k: top_k.max(1),
        }
    }

    /// Answer `question` from the documents of `session`
    ///
    /// An empty retrieval still reaches the model, with a note in place of
    /// the context.
    pub async fn ask(&self, session: &str, question: &str) -> Result<ChatAnswer> {
        if !self.store.has_collection(session).await? {
            return Err(Error::SessionNotFound(session.to_string()));
        }

        let query_embedding = self.embedder.embed(question).await?;
        let results = self
            .store
            .query(session, &query_embedding, self.top_k)
            .await?;

        if results.is_empty() {
            tracing::info!("No context found in '{}' for question", session);
        } else {
            tracing::debug!(
                "Retrieved {} chunks from '{}', best match {} ({:.3})",
                results.len(),
                session,
                results[0].chunk.source.format_citation(),
                results[0].similarity
            );
        }

        let messages = PromptBuilder::build_messages(session, question, &results);
        let answer = self.llm.complete(&messages).await?;

        let citations = results
            .iter()
            .map(|r| Citation::from_chunk(&r.chunk, r.similarity))
            .collect();

        Ok(ChatAnswer {
            answer,
            citations,
            model: self.llm.model().to_string(),
        })
    }
}
