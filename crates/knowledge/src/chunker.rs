//! Fixed-window text chunking with overlap.
//!
//! Windows are measured in characters, not bytes, so multi-byte text is never
//! split inside a code point. Consecutive chunks share exactly `overlap`
//! characters; only the last chunk may be shorter than `window_size`.

use crate::types::{Chunk, RawDocument};
use docqa_core::{AppError, AppResult};
use std::collections::BTreeMap;

/// Validated chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    window_size: usize,
    overlap: usize,
}

impl ChunkerConfig {
    /// Requires `window_size > overlap`; `overlap` may be zero.
    pub fn new(window_size: usize, overlap: usize) -> AppResult<Self> {
        if window_size == 0 || window_size <= overlap {
            return Err(AppError::InvalidConfiguration(format!(
                "chunk window size must exceed overlap (window_size={}, overlap={})",
                window_size, overlap
            )));
        }
        Ok(Self {
            window_size,
            overlap,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn step(&self) -> usize {
        self.window_size - self.overlap
    }
}

/// Split `text` into overlapping windows, validating the parameters first.
pub fn split<'a>(
    document_id: &'a str,
    text: &'a str,
    window_size: usize,
    overlap: usize,
) -> AppResult<Chunks<'a>> {
    Ok(Chunks::new(
        document_id,
        text,
        ChunkerConfig::new(window_size, overlap)?,
    ))
}

/// Chunk a loaded document, attaching page and source metadata.
pub fn chunk_document(document: &RawDocument, config: ChunkerConfig) -> Vec<Chunk> {
    let chunks: Vec<Chunk> = Chunks::new(&document.id, &document.content, config)
        .map(|mut chunk| {
            let start = chunk.sequence_index * config.step();
            if let Some(page) = document.page_at(start) {
                chunk.metadata.insert("page".to_string(), page.to_string());
            }
            chunk
                .metadata
                .insert("source".to_string(), document.location.clone());
            chunk
        })
        .collect();

    tracing::debug!(
        document = %document.id,
        chunks = chunks.len(),
        window_size = config.window_size,
        overlap = config.overlap,
        "Chunked document"
    );

    chunks
}

/// Lazy, restartable sequence of chunks. Clone it to iterate again from the start.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    document_id: &'a str,
    text: &'a str,
    config: ChunkerConfig,
    /// Byte offset of every char boundary, ending with `text.len()`
    boundaries: Vec<usize>,
    next_start: usize,
    sequence_index: usize,
    finished: bool,
}

impl<'a> Chunks<'a> {
    pub fn new(document_id: &'a str, text: &'a str, config: ChunkerConfig) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());

        Self {
            document_id,
            text,
            config,
            boundaries,
            next_start: 0,
            sequence_index: 0,
            finished: text.is_empty(),
        }
    }

    fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.finished {
            return None;
        }

        let start = self.next_start;
        let end = (start + self.config.window_size).min(self.char_len());
        let text = &self.text[self.boundaries[start]..self.boundaries[end]];

        let mut metadata = BTreeMap::new();
        metadata.insert("start".to_string(), start.to_string());
        metadata.insert("end".to_string(), end.to_string());

        let chunk = Chunk {
            document_id: self.document_id.to_string(),
            text: text.to_string(),
            sequence_index: self.sequence_index,
            metadata,
        };

        if end == self.char_len() {
            self.finished = true;
        } else {
            self.next_start = start + self.config.step();
            self.sequence_index += 1;
        }

        Some(chunk)
    }
}

/// Number of chunks `Chunks` yields for a text of `char_len` characters.
pub fn expected_chunk_count(char_len: usize, config: ChunkerConfig) -> usize {
    if char_len == 0 {
        return 0;
    }
    if char_len <= config.window_size {
        return 1;
    }
    (char_len - config.overlap).div_ceil(config.step())
}
