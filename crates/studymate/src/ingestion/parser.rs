//! PDF text extraction

use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Bytes every PDF file starts with
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Parsed document with per-page text
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// SHA-256 of the raw file bytes
    pub content_hash: String,
    /// Page count reported by the PDF (at least 1)
    pub total_pages: u32,
    /// Pages that produced text
    pub pages: Vec<PageContent>,
}

/// Content from a single page
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Page number (1-indexed), `None` when the text could not be attributed
    pub page_number: Option<u32>,
    /// Text content of the page
    pub content: String,
}

/// PDF parser: lopdf page by page, pdf-extract as fallback
#[derive(Debug, Clone)]
pub struct PdfParser {
    /// Upper bound for the pdf-extract fallback
    fallback_timeout: Duration,
}

impl Default for PdfParser {
    fn default() -> Self {
        Self {
            fallback_timeout: Duration::from_secs(60),
        }
    }
}

impl PdfParser {
    pub fn new(fallback_timeout: Duration) -> Self {
        Self { fallback_timeout }
    }

    /// Read and parse the PDF at `path`; returns the parsed text and the
    /// file size in bytes
    pub fn parse_file(&self, path: &Path) -> Result<(ParsedDocument, u64)> {
        let display = path.display().to_string();

        if !path.is_file() {
            let reason = if path.exists() { "not a regular file" } else { "file not found" };
            return Err(Error::file_parse(display, reason));
        }

        let data = std::fs::read(path).map_err(|e| Error::file_parse(&display, e.to_string()))?;
        let parsed = self.parse(&display, &data)?;
        Ok((parsed, data.len() as u64))
    }

    /// Parse PDF bytes
    pub fn parse(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        if !data.starts_with(PDF_MAGIC) {
            return Err(Error::UnsupportedFileType(format!("{} is not a PDF", filename)));
        }

        let (total_pages, mut pages) = match lopdf::Document::load_mem(data) {
            Ok(doc) => Self::extract_pages(&doc),
            Err(e) => {
                tracing::warn!("lopdf could not load {}: {}, trying pdf-extract", filename, e);
                (1, Vec::new())
            }
        };

        if pages.is_empty() {
            let text = clean_text(&self.extract_with_timeout(filename, data)?);
            if !text.is_empty() {
                pages.push(PageContent {
                    page_number: (total_pages == 1).then_some(1),
                    content: text,
                });
            }
        }

        if pages.is_empty() {
            return Err(Error::file_parse(
                filename,
                "No text content could be extracted, the PDF may be image-based",
            ));
        }

        tracing::debug!("Extracted {} of {} pages from {}", pages.len(), total_pages, filename);

        Ok(ParsedDocument {
            content_hash: hash_content(data),
            total_pages,
            pages,
        })
    }

    /// Page-by-page extraction; pages without text are skipped
    fn extract_pages(doc: &lopdf::Document) -> (u32, Vec<PageContent>) {
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let total = page_numbers.len().max(1) as u32;

        let pages = page_numbers
            .into_iter()
            .filter_map(|page_number| match doc.extract_text(&[page_number]) {
                Ok(text) => {
                    let content = clean_text(&text);
                    (!content.is_empty()).then_some(PageContent {
                        page_number: Some(page_number),
                        content,
                    })
                }
                Err(e) => {
                    tracing::debug!("Could not get text for page {}: {}", page_number, e);
                    None
                }
            })
            .collect();

        (total, pages)
    }

    /// pdf-extract can hang on some fonts, so it runs on its own thread
    fn extract_with_timeout(&self, filename: &str, data: &[u8]) -> Result<String> {
        use std::sync::mpsc;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&data_vec));
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.fallback_timeout) {
            Ok(Ok(Ok(text))) => Ok(text),
            Ok(Ok(Err(e))) => Err(Error::file_parse(filename, format!("Failed to load PDF: {}", e))),
            Ok(Err(_)) => Err(Error::file_parse(filename, "PDF extraction crashed")),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!("PDF extraction timeout after {:?}", self.fallback_timeout);
                Err(Error::file_parse(filename, "PDF extraction timed out"))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(Error::file_parse(filename, "PDF extraction thread stopped"))
            }
        }
    }
}

/// Normalise extracted text: fold ligatures and typographic punctuation,
/// trim lines, keep single blank lines as paragraph breaks
pub fn clean_text(text: &str) -> String {
    let folded = text
        .replace('\0', "")
        .replace('\u{00A0}', " ")
        .replace(['\u{2010}', '\u{2011}', '\u{2013}'], "-")
        .replace('\u{2014}', "--")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl");

    let mut out = String::with_capacity(folded.len());
    let mut blank_run = false;

    for line in folded.lines().map(str::trim) {
        if line.is_empty() {
            blank_run = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = false;
    }

    out
}

/// Hash file bytes
fn hash_content(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
