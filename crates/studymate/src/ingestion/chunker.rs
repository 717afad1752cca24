//! Recursive character chunking with overlap and page tracking

use std::collections::VecDeque;

use crate::types::{Chunk, ChunkSource, Document};
use super::parser::ParsedDocument;

/// Separators tried in order: paragraphs, lines, sentences, words
const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ".", " "];

/// Text chunker with configurable size and overlap
///
/// Text is split on the coarsest separator that occurs in it; pieces that are
/// still larger than `chunk_size` are split again with the next separator,
/// and as a last resort into fixed character windows. Adjacent pieces are then
/// merged into chunks of at most `chunk_size` characters, each chunk starting
/// with up to `overlap` characters from the end of the previous one.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
            min_size: 1,
        }
    }

    /// Drop chunks shorter than `min_size` characters
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size.max(1);
        self
    }

    /// Chunk every page of a parsed document; chunk indices run across pages
    pub fn chunk_document(&self, doc: &Document, parsed: &ParsedDocument) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in &parsed.pages {
            let source = ChunkSource::page(doc, page.page_number);
            for text in self.split_text(&page.content) {
                let index = chunks.len() as u32;
                chunks.push(Chunk::new(doc.id, text, source.clone(), index));
            }
        }

        chunks
    }

    /// Split text into overlapping chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, DEFAULT_SEPARATORS)
            .into_iter()
            .filter(|chunk| char_len(chunk) >= self.min_size)
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators.iter().position(|sep| text.contains(sep));
        let Some(position) = position else {
            return self.split_fixed(text);
        };
        let separator = separators[position];
        let finer = &separators[position + 1..];

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in text.split_inclusive(separator) {
            if char_len(piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }
            chunks.extend(self.split_recursive(piece, finer));
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }

        chunks
    }

    /// Merge small pieces into windows of at most `chunk_size` characters
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut chunks, window.iter().map(|(p, _)| *p).collect::<String>());

                // Keep the tail as overlap, but leave room for the new piece
                while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, front_len)) => total -= front_len,
                        None => break,
                    }
                }
            }

            window.push_back((piece, len));
            total += len;
        }

        if !window.is_empty() {
            push_trimmed(&mut chunks, window.iter().map(|(p, _)| *p).collect::<String>());
        }

        chunks
    }

    /// Fixed character windows for text without any separator
    fn split_fixed(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            push_trimmed(&mut chunks, chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(500, 100)
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn push_trimmed(chunks: &mut Vec<String>, text: String) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
