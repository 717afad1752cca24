//! Document ingestion pipeline: PDF text extraction, chunking, embedding

mod chunker;
mod parser;
mod processor;

pub use chunker::TextChunker;
pub use parser::{clean_text, PageContent, ParsedDocument, PdfParser};
pub use processor::DocumentIngestor;

#[cfg(test)]
pub(crate) use parser::tests::build_pdf;
