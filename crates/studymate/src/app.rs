//! Application state shared by the shell and the one-shot commands

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

use crate::chat::RagAssistant;
use crate::config::StudyMateConfig;
use crate::error::{Error, Result};
use crate::ingestion::DocumentIngestor;
use crate::providers::{
    EmbeddingProvider, GroqClient, LlmProvider, LocalVectorStore, OllamaEmbedder,
    VectorStoreProvider,
};
use crate::session::SessionRegistry;
use crate::types::{ChatAnswer, IngestReport};

/// Sessions, documents and questions behind one handle
pub struct StudyMate {
    config: StudyMateConfig,
    registry: Mutex<SessionRegistry>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    ingestor: DocumentIngestor,
    /// `None` when no chat backend could be built (e.g. missing API key)
    assistant: Option<RagAssistant>,
}

impl StudyMate {
    /// Build the production stack: Ollama embeddings, Groq chat, SQLite store
    ///
    /// A missing API key does not prevent session and document management;
    /// it only makes [`StudyMate::ask`] fail.
    pub fn from_config(config: StudyMateConfig) -> Result<Self> {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedder::new(&config.embeddings)?);
        let store: Arc<dyn VectorStoreProvider> =
            Arc::new(LocalVectorStore::open(&config.workspace.storage_path)?);

        let llm: Option<Arc<dyn LlmProvider>> = match GroqClient::new(&config.llm) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!("Chat is unavailable: {}", e);
                None
            }
        };

        Self::assemble(config, embedder, llm, store)
    }

    /// Build with explicit providers
    pub fn with_providers(
        config: StudyMateConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Result<Self> {
        Self::assemble(config, embedder, Some(llm), store)
    }

    fn assemble(
        config: StudyMateConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Option<Arc<dyn LlmProvider>>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Result<Self> {
        let registry = SessionRegistry::open(&config.workspace.registry_path)?;
        let ingestor = DocumentIngestor::new(&config, embedder.clone(), store.clone());
        let assistant = llm.map(|llm| {
            RagAssistant::new(embedder.clone(), llm, store.clone(), config.retrieval.top_k)
        });

        tracing::debug!(
            "StudyMate ready: embeddings={} ({}), store={}, registry={}",
            embedder.name(),
            embedder.model(),
            store.name(),
            config.workspace.registry_path.display()
        );

        Ok(Self {
            config,
            registry: Mutex::new(registry),
            embedder,
            store,
            ingestor,
            assistant,
        })
    }

    pub fn config(&self) -> &StudyMateConfig {
        &self.config
    }

    /// Whether the embedding backend answers
    pub async fn embedder_available(&self) -> bool {
        self.embedder.health_check().await.unwrap_or(false)
    }

    /// Register a session and create its collection
    pub async fn create_session(&self, name: &str) -> Result<()> {
        {
            let registry = self.registry.lock();
            SessionRegistry::validate_name(name)?;
            if registry.contains(name) {
                return Err(Error::SessionExists(name.to_string()));
            }
        }

        self.store.create_collection(name).await?;
        self.registry.lock().create(name)
    }

    /// Session names in creation order
    pub fn list_sessions(&self) -> Vec<String> {
        self.registry.lock().list().to_vec()
    }

    pub fn has_session(&self, name: &str) -> bool {
        self.registry.lock().contains(name)
    }

    /// Drop the session's collection, then forget its name
    pub async fn delete_session(&self, name: &str) -> Result<()> {
        self.registry.lock().require(name)?;

        if !self.store.drop_collection(name).await? {
            tracing::warn!("Session '{}' had no collection", name);
        }
        self.registry.lock().remove(name)
    }

    /// Ingest one PDF into a registered session
    pub async fn add_document(&self, session: &str, path: impl Into<PathBuf>) -> Result<IngestReport> {
        self.open_session(session).await?;
        self.ingestor.add(session, &path.into()).await
    }

    /// Ingest several PDFs, one outcome per file
    pub async fn add_documents(
        &self,
        session: &str,
        paths: &[PathBuf],
    ) -> Result<Vec<(PathBuf, Result<IngestReport>)>> {
        self.open_session(session).await?;
        Ok(self.ingestor.add_many(session, paths).await)
    }

    /// Answer a question from a registered session's documents
    pub async fn ask(&self, session: &str, question: &str) -> Result<ChatAnswer> {
        let assistant = self.assistant()?;
        self.open_session(session).await?;
        assistant.ask(session, question).await
    }

    /// Number of chunks stored for a session
    pub async fn chunk_count(&self, session: &str) -> Result<usize> {
        self.open_session(session).await?;
        self.store.count(session).await
    }

    fn assistant(&self) -> Result<&RagAssistant> {
        match &self.assistant {
            Some(assistant) => Ok(assistant),
            None => {
                self.config.llm.api_key()?;
                Err(Error::Config("Chat backend is not available".to_string()))
            }
        }
    }

    /// Registered sessions always have a collection, even when the vector
    /// database was removed after they were created
    async fn open_session(&self, session: &str) -> Result<()> {
        self.registry.lock().require(session)?;
        self.store.create_collection(session).await
    }
}
