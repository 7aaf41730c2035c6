//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Message returned when no document or chunk is relevant to a query.
pub const NO_RELEVANT_INFORMATION: &str = "Sorry, no relevant information found in documents.";

/// Where a raw document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    File,
    Url,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Url => "url",
        }
    }
}

/// Text of one document as produced by a loader. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    /// Document identifier (registry key)
    pub id: String,

    /// Extracted plain text
    pub content: String,

    /// File or URL
    pub source_kind: SourceKind,

    /// Path or URL the content was loaded from
    pub location: String,

    /// Character offset at which each page begins. Empty for unpaginated sources.
    #[serde(default)]
    pub page_starts: Vec<usize>,

    /// When the document was loaded
    pub loaded_at: DateTime<Utc>,
}

impl RawDocument {
    /// Build an unpaginated document; mostly useful for tests and in-memory corpora.
    pub fn from_text(
        id: impl Into<String>,
        content: impl Into<String>,
        source_kind: SourceKind,
    ) -> Self {
        let id = id.into();
        Self {
            location: id.clone(),
            id,
            content: content.into(),
            source_kind,
            page_starts: Vec::new(),
            loaded_at: Utc::now(),
        }
    }

    /// 1-based page containing the character at `char_offset`, if pages are known.
    pub fn page_at(&self, char_offset: usize) -> Option<usize> {
        if self.page_starts.is_empty() {
            return None;
        }
        Some(self.page_starts.partition_point(|&start| start <= char_offset).max(1))
    }
}

/// A bounded, contiguous slice of a document's text; the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Document this chunk was cut from
    pub document_id: String,

    /// Chunk text (at most `window_size` characters)
    pub text: String,

    /// Position within the document, starting at 0
    pub sequence_index: usize,

    /// Free-form annotations ("start", "end", "page", "source")
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Chunk {
    /// Page number recorded in metadata, if any.
    pub fn page(&self) -> Option<&str> {
        self.metadata.get("page").map(String::as_str)
    }
}

/// A chunk returned by a similarity search, with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

impl RetrievedChunk {
    pub fn document_id(&self) -> &str {
        &self.chunk.document_id
    }
}

/// A single source reference used to answer a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Registry id of the document
    pub document_id: String,

    /// Human-readable location ("page 3", "chunk 2")
    pub location: String,

    /// Short snippet of the supporting text
    pub snippet: String,
}

/// Answer text plus the sources it was grounded on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<SourceRef>,
}

/// Result of running one query through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// A reviewed answer
    Answered(Answer),
    /// Routing or retrieval found nothing to answer from
    NoRelevantInformation,
}

impl QueryOutcome {
    /// The user-facing text for this outcome.
    pub fn text(&self) -> &str {
        match self {
            Self::Answered(answer) => &answer.text,
            Self::NoRelevantInformation => NO_RELEVANT_INFORMATION,
        }
    }

    pub fn sources(&self) -> &[SourceRef] {
        match self {
            Self::Answered(answer) => &answer.sources,
            Self::NoRelevantInformation => &[],
        }
    }
}
