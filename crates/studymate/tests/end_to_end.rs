//! Session lifecycle, ingestion and chat against a real SQLite store with
//! deterministic in-process embedding and chat providers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use studymate::config::{StudyMateConfig, WorkspaceConfig};
use studymate::generation::NO_CONTEXT_NOTE;
use studymate::providers::{
    ChatMessage, EmbeddingProvider, LlmProvider, LocalVectorStore, VectorStoreProvider,
};
use studymate::{Error, Result, StudyMate};

const DIMENSIONS: usize = 64;

/// Bag of words hashed into a fixed number of buckets
struct HashingEmbedder;

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0; DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2)
        {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
            vector[(hash % DIMENSIONS as u64) as usize] += 1.0;
        }
        Ok(vector)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hashing"
    }

    fn model(&self) -> &str {
        "hashing-64"
    }
}

/// Answers with the first line of the supplied context
struct FirstLineLlm;

#[async_trait]
impl LlmProvider for FirstLineLlm {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let user = messages
            .iter()
            .rev()
            .find(|m| m.content.starts_with("Question: "))
            .ok_or_else(|| Error::llm("no user message"))?;
        let context = user.content.split("Context: ").nth(1).unwrap_or_default();
        Ok(context.lines().next().unwrap_or_default().to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "first-line"
    }

    fn model(&self) -> &str {
        "first-line"
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    app: StudyMate,
    store: Arc<LocalVectorStore>,
}

fn fixture(chunk_size: usize, overlap: usize) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();

    let mut config = StudyMateConfig {
        workspace: WorkspaceConfig::in_dir(&root),
        ..StudyMateConfig::default()
    };
    config.chunking.chunk_size = chunk_size;
    config.chunking.chunk_overlap = overlap;

    let store = Arc::new(LocalVectorStore::open(&config.workspace.storage_path).unwrap());
    let app = StudyMate::with_providers(
        config,
        Arc::new(HashingEmbedder),
        Arc::new(FirstLineLlm),
        store.clone(),
    )
    .unwrap();

    Fixture {
        _dir: dir,
        root,
        app,
        store,
    }
}

/// Write a PDF with one page per entry, each entry a list of text lines
fn write_pdf(dir: &Path, name: &str, pages: &[&[&str]]) -> PathBuf {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 11.into()]),
                Operation::new("Td", vec![60.into(), (780 - 16 * i as i64).into()]),
                Operation::new("Tj", vec![Object::string_literal(*line)]),
                Operation::new("ET", vec![]),
            ]);
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

#[tokio::test]
async fn create_add_ask_answers_from_pdf() {
    let f = fixture(500, 100);
    f.app.create_session("S1").await.unwrap();

    let pdf = write_pdf(&f.root, "sample.pdf", &[&["The capital of France is Paris."]]);
    let report = f.app.add_document("S1", &pdf).await.unwrap();
    assert_eq!(report.filename, "sample.pdf");
    assert!(report.chunks >= 1);

    let answer = f
        .app
        .ask("S1", "What is the capital of France?")
        .await
        .unwrap();

    assert!(answer.answer.contains("Paris"), "answer was {:?}", answer.answer);
    assert_eq!(answer.citations[0].filename, "sample.pdf");
    assert_eq!(answer.citations[0].page_number, Some(1));
}

#[tokio::test]
async fn duplicate_session_leaves_registry_unchanged() {
    let f = fixture(500, 100);
    f.app.create_session("physics").await.unwrap();
    let registry = f.root.join("sessions.txt");
    let before = std::fs::read_to_string(&registry).unwrap();

    let err = f.app.create_session("physics").await.unwrap_err();

    assert!(matches!(err, Error::SessionExists(_)));
    assert_eq!(std::fs::read_to_string(&registry).unwrap(), before);
}

#[tokio::test]
async fn delete_removes_session_everywhere() {
    let f = fixture(500, 100);
    f.app.create_session("history").await.unwrap();
    f.app.create_session("art").await.unwrap();
    let pdf = write_pdf(&f.root, "rome.pdf", &[&["Rome was not built in a day."]]);
    f.app.add_document("history", &pdf).await.unwrap();

    f.app.delete_session("history").await.unwrap();

    assert_eq!(f.app.list_sessions(), vec!["art"]);
    let registry = std::fs::read_to_string(f.root.join("sessions.txt")).unwrap();
    assert!(!registry.lines().any(|l| l == "history"));
    assert!(!f.store.has_collection("history").await.unwrap());
}

#[tokio::test]
async fn missing_pdf_leaves_chunk_count_unchanged() {
    let f = fixture(500, 100);
    f.app.create_session("bio").await.unwrap();
    let pdf = write_pdf(&f.root, "cells.pdf", &[&["Cells are the unit of life."]]);
    f.app.add_document("bio", &pdf).await.unwrap();
    let before = f.app.chunk_count("bio").await.unwrap();

    let err = f
        .app
        .add_document("bio", f.root.join("does-not-exist.pdf"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::FileParse { .. }));
    assert_eq!(f.app.chunk_count("bio").await.unwrap(), before);
}

#[tokio::test]
async fn verbatim_phrase_is_retrieved() {
    let f = fixture(80, 20);
    f.app.create_session("bio").await.unwrap();

    let pdf = write_pdf(
        &f.root,
        "biology.pdf",
        &[
            &[
                "Enzymes speed up chemical reactions in living organisms.",
                "Proteins fold into specific three dimensional shapes.",
                "Osmosis moves water across a semipermeable membrane.",
            ],
            &[
                "Mitochondria are the powerhouse of the cell.",
                "Photosynthesis converts sunlight into chemical energy.",
                "Genes are made of DNA and are passed to offspring.",
            ],
        ],
    );
    let report = f.app.add_document("bio", &pdf).await.unwrap();
    assert!(report.chunks > 1);

    let phrase = "Mitochondria are the powerhouse of the cell";
    let query = HashingEmbedder.embed(phrase).await.unwrap();
    let hits = f.store.query("bio", &query, 5).await.unwrap();

    assert!(hits.iter().any(|h| h.chunk.content.contains(phrase)));
}

#[tokio::test]
async fn empty_session_still_gets_an_answer() {
    let f = fixture(500, 100);
    f.app.create_session("empty").await.unwrap();

    let answer = f.app.ask("empty", "What is entropy?").await.unwrap();

    assert!(!answer.had_context());
    assert_eq!(answer.answer, NO_CONTEXT_NOTE);
}

#[tokio::test]
async fn sessions_survive_restart() {
    let f = fixture(500, 100);
    f.app.create_session("chem").await.unwrap();
    let pdf = write_pdf(&f.root, "atoms.pdf", &[&["Atoms contain protons and neutrons."]]);
    f.app.add_document("chem", &pdf).await.unwrap();
    let count = f.app.chunk_count("chem").await.unwrap();

    let config = StudyMateConfig {
        workspace: WorkspaceConfig::in_dir(&f.root),
        ..StudyMateConfig::default()
    };
    let store = Arc::new(LocalVectorStore::open(&config.workspace.storage_path).unwrap());
    let reopened = StudyMate::with_providers(
        config,
        Arc::new(HashingEmbedder),
        Arc::new(FirstLineLlm),
        store,
    )
    .unwrap();

    assert_eq!(reopened.list_sessions(), vec!["chem"]);
    assert_eq!(reopened.chunk_count("chem").await.unwrap(), count);
}
