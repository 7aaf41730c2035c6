//! Multi-document chunk retrieval.

use crate::registry::IndexRegistry;
use crate::types::RetrievedChunk;
use docqa_core::{AppError, AppResult};
use futures::future::try_join_all;

#[derive(Debug, Clone)]
pub struct Retriever {
    registry: IndexRegistry,
}

impl Retriever {
    pub fn new(registry: IndexRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Top-`k` chunks from each of `document_ids`, concatenated in the order
    /// the ids were given.
    ///
    /// Results are not re-ranked across documents: each document contributes
    /// its own top `k`. Searches run concurrently.
    pub async fn retrieve(
        &self,
        query: &str,
        document_ids: &[String],
        k: usize,
    ) -> AppResult<Vec<RetrievedChunk>> {
        if document_ids.is_empty() {
            return Ok(Vec::new());
        }

        let indices = document_ids
            .iter()
            .map(|id| {
                self.registry
                    .get(id)
                    .ok_or_else(|| AppError::UnknownDocument(id.clone()))
            })
            .collect::<AppResult<Vec<_>>>()?;

        let per_document = try_join_all(indices.iter().map(|index| index.search(query, k))).await?;

        let chunks: Vec<RetrievedChunk> = per_document.into_iter().flatten().collect();
        tracing::info!(
            documents = document_ids.len(),
            chunks = chunks.len(),
            k,
            "Retrieved chunks"
        );
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::EmbeddingProvider;
    use crate::index::{DocumentIndex, IndexOptions};
    use crate::tests::support::{chunk, StubEmbedder};
    use std::sync::Arc;

    async fn registry(embedder: Arc<StubEmbedder>) -> IndexRegistry {
        let embedder: Arc<dyn EmbeddingProvider> = embedder;
        let a = DocumentIndex::from_chunks(
            "A",
            vec![chunk("A", 0, "a0"), chunk("A", 1, "a1"), chunk("A", 2, "a2")],
            Arc::clone(&embedder),
            IndexOptions::default(),
        )
        .await
        .unwrap();
        let b = DocumentIndex::from_chunks(
            "B",
            vec![chunk("B", 0, "b0"), chunk("B", 1, "b1")],
            Arc::clone(&embedder),
            IndexOptions::default(),
        )
        .await
        .unwrap();
        IndexRegistry::from_indices([a, b])
    }

    fn stub() -> StubEmbedder {
        StubEmbedder::new(2)
            .with("q", vec![1.0, 0.0])
            .with("a0", vec![0.1, 1.0])
            .with("a1", vec![1.0, 0.1])
            .with("a2", vec![0.5, 0.5])
            .with("b0", vec![1.0, 0.0])
            .with("b1", vec![0.0, 1.0])
    }

    #[tokio::test]
    async fn test_empty_ids_make_no_calls() {
        let embedder = Arc::new(stub());
        let retriever = Retriever::new(registry(embedder.clone()).await);
        let before = embedder.calls();

        let chunks = retriever.retrieve("q", &[], 5).await.unwrap();
        assert!(chunks.is_empty());
        assert_eq!(embedder.calls(), before);
    }

    #[tokio::test]
    async fn test_results_follow_id_order_without_reranking() {
        let retriever = Retriever::new(registry(Arc::new(stub())).await);

        let chunks = retriever
            .retrieve("q", &["B".to_string(), "A".to_string()], 2)
            .await
            .unwrap();

        let texts: Vec<_> = chunks.iter().map(|c| c.chunk.text.as_str()).collect();
        // b1 scores lower than a1 and a2 but stays ahead of them.
        assert_eq!(texts, vec!["b0", "b1", "a1", "a2"]);
    }

    #[tokio::test]
    async fn test_unknown_document_is_contract_error() {
        let retriever = Retriever::new(registry(Arc::new(stub())).await);

        let result = retriever.retrieve("q", &["A".to_string(), "C".to_string()], 5).await;
        match result {
            Err(AppError::UnknownDocument(id)) => assert_eq!(id, "C"),
            other => panic!("expected unknown document, got {:?}", other),
        }
    }
}
