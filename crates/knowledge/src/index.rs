//! Per-document vector index.
//!
//! A flat in-memory index: every chunk of one document paired with its
//! embedding, scored exhaustively at query time. An index only exists once
//! every chunk has a validated embedding, so a half-built index is never
//! observable.

use crate::chunker::{chunk_document, ChunkerConfig};
use crate::embeddings::{EmbeddingProvider, SimilarityMetric};
use crate::timeout::with_deadline;
use crate::types::{Chunk, RawDocument, RetrievedChunk};
use docqa_core::{AppError, AppResult};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Knobs shared by every index built for one corpus.
#[derive(Debug, Clone, Copy)]
pub struct IndexOptions {
    pub metric: SimilarityMetric,
    /// Texts per embedding request
    pub batch_size: usize,
    /// Deadline for each embedding call; a batch gets one deadline per text
    pub timeout: Duration,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            metric: SimilarityMetric::Cosine,
            batch_size: 100,
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct DocumentIndex {
    document_id: String,
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    dimensions: usize,
    metric: SimilarityMetric,
    embedder: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
}

impl fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("document_id", &self.document_id)
            .field("chunks", &self.chunks.len())
            .field("dimensions", &self.dimensions)
            .field("metric", &self.metric)
            .field("embedder", &self.embedder.provider_name())
            .finish()
    }
}

impl DocumentIndex {
    /// Chunk `document` and embed every chunk.
    pub async fn build(
        document: &RawDocument,
        chunker: ChunkerConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        options: IndexOptions,
    ) -> AppResult<Self> {
        let chunks = chunk_document(document, chunker);
        Self::from_chunks(&document.id, chunks, embedder, options).await
    }

    /// Embed prebuilt chunks. Every chunk must belong to `document_id`.
    pub async fn from_chunks(
        document_id: &str,
        chunks: Vec<Chunk>,
        embedder: Arc<dyn EmbeddingProvider>,
        options: IndexOptions,
    ) -> AppResult<Self> {
        if options.batch_size == 0 {
            return Err(AppError::InvalidConfiguration(
                "embedding batch size must be greater than zero".to_string(),
            ));
        }
        if let Some(stray) = chunks.iter().find(|c| c.document_id != document_id) {
            return Err(AppError::InvalidArgument(format!(
                "chunk from '{}' cannot be indexed under '{}'",
                stray.document_id, document_id
            )));
        }

        let declared = embedder.dimensions();
        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(options.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            // Providers may embed a batch one text per request.
            let deadline = options.timeout.saturating_mul(texts.len() as u32);
            let vectors = with_deadline(
                deadline,
                "embedding request",
                AppError::EmbeddingService,
                embedder.embed_batch(&texts),
            )
            .await?;

            if vectors.len() != texts.len() {
                return Err(AppError::EmbeddingService(format!(
                    "embedder returned {} vectors for {} chunks of '{}'",
                    vectors.len(),
                    texts.len(),
                    document_id
                )));
            }
            embeddings.extend(vectors);
        }

        for (i, vector) in embeddings.iter().enumerate() {
            check_vector(vector, declared).map_err(|reason| {
                AppError::EmbeddingService(format!(
                    "chunk {} of '{}': {}",
                    i, document_id, reason
                ))
            })?;
        }

        tracing::debug!(
            document = document_id,
            chunks = chunks.len(),
            dimensions = declared,
            "Built document index"
        );

        Ok(Self {
            document_id: document_id.to_string(),
            chunks,
            embeddings,
            dimensions: declared,
            metric: options.metric,
            embedder,
            timeout: options.timeout,
        })
    }

    /// Up to `k` chunks ordered by descending score, ties by ascending sequence index.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<RetrievedChunk>> {
        if k == 0 {
            return Err(AppError::InvalidArgument(
                "k must be at least 1".to_string(),
            ));
        }
        if self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = with_deadline(
            self.timeout,
            "query embedding",
            AppError::EmbeddingService,
            self.embedder.embed(query),
        )
        .await?;

        check_vector(&query_vector, self.dimensions).map_err(|reason| {
            AppError::EmbeddingService(format!(
                "query embedding for '{}': {}",
                self.document_id, reason
            ))
        })?;

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, vector)| (i, self.metric.score(&query_vector, vector)))
            .collect();

        scored.sort_by(|(a_idx, a_score), (b_idx, b_score)| {
            b_score.total_cmp(a_score).then_with(|| {
                self.chunks[*a_idx]
                    .sequence_index
                    .cmp(&self.chunks[*b_idx].sequence_index)
            })
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| RetrievedChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }
}

fn check_vector(vector: &[f32], expected: usize) -> Result<(), String> {
    if vector.is_empty() {
        return Err("empty embedding vector".to_string());
    }
    if vector.len() != expected {
        return Err(format!(
            "dimension mismatch: got {}, expected {}",
            vector.len(),
            expected
        ));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err("embedding contains non-finite values".to_string());
    }
    Ok(())
}
