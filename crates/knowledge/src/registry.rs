//! The named set of document indices built at startup.

use crate::chunker::ChunkerConfig;
use crate::embeddings::EmbeddingProvider;
use crate::index::{DocumentIndex, IndexOptions};
use crate::loader::DocumentLoader;
use docqa_core::{AppError, AppResult};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A document that could not be indexed, and why.
#[derive(Debug, Clone, Serialize)]
pub struct FailedDocument {
    pub document_id: String,
    pub location: String,
    pub error: String,
}

/// Summary of one registry build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// Ids that made it into the registry
    pub indexed: Vec<String>,
    pub failed: Vec<FailedDocument>,
    pub duration: Duration,
}

impl BuildReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Immutable mapping of document id to its index.
///
/// Built once, then shared read-only (clone is cheap) across any number of
/// concurrent queries.
#[derive(Debug, Clone, Default)]
pub struct IndexRegistry {
    indices: BTreeMap<String, Arc<DocumentIndex>>,
}

impl IndexRegistry {
    /// Load and index every `(id, location)` pair, at most `concurrency` at a time.
    ///
    /// A document that fails to load or embed is left out of the registry and
    /// recorded in the report; the build itself only fails on bad parameters.
    pub async fn build(
        documents: &BTreeMap<String, String>,
        loader: &dyn DocumentLoader,
        chunker: ChunkerConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        options: IndexOptions,
        concurrency: usize,
    ) -> AppResult<(Self, BuildReport)> {
        if concurrency == 0 {
            return Err(AppError::InvalidConfiguration(
                "build concurrency must be at least 1".to_string(),
            ));
        }

        let started = Instant::now();
        tracing::info!(
            documents = documents.len(),
            concurrency,
            embedder = embedder.provider_name(),
            model = embedder.model_name(),
            "Building document indices"
        );

        let results: Vec<(String, String, AppResult<DocumentIndex>)> =
            stream::iter(documents.iter())
                .map(|(id, location)| {
                    let embedder = Arc::clone(&embedder);
                    async move {
                        let result: AppResult<DocumentIndex> = async {
                            let document = loader.load(id, location).await?;
                            DocumentIndex::build(&document, chunker, embedder, options).await
                        }
                        .await;
                        (id.clone(), location.clone(), result)
                    }
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;

        let mut indices = BTreeMap::new();
        let mut failed = Vec::new();

        for (id, location, result) in results {
            match result {
                Ok(index) => {
                    tracing::info!(document = %id, chunks = index.len(), "Indexed document");
                    indices.insert(id, Arc::new(index));
                }
                Err(e) => {
                    tracing::warn!(document = %id, location = %location, "Skipping document: {}", e);
                    failed.push(FailedDocument {
                        document_id: id,
                        location,
                        error: e.to_string(),
                    });
                }
            }
        }
        failed.sort_by(|a, b| a.document_id.cmp(&b.document_id));

        let registry = Self { indices };
        let report = BuildReport {
            indexed: registry.keys(),
            failed,
            duration: started.elapsed(),
        };

        tracing::info!(
            indexed = report.indexed.len(),
            failed = report.failed.len(),
            "Registry ready in {:.2?}",
            report.duration
        );

        Ok((registry, report))
    }

    /// Assemble a registry from indices built elsewhere. Later duplicates win.
    pub fn from_indices(indices: impl IntoIterator<Item = DocumentIndex>) -> Self {
        Self {
            indices: indices
                .into_iter()
                .map(|index| (index.document_id().to_string(), Arc::new(index)))
                .collect(),
        }
    }

    /// Document ids in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.indices.keys().cloned().collect()
    }

    pub fn get(&self, document_id: &str) -> Option<&Arc<DocumentIndex>> {
        self.indices.get(document_id)
    }

    pub fn contains(&self, document_id: &str) -> bool {
        self.indices.contains_key(document_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<DocumentIndex>)> {
        self.indices.iter()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
