//! Document question answering over a fixed corpus.
//!
//! Startup loads every configured document, chunks it and builds one vector
//! index per document (`IndexRegistry`). Each query then flows through:
//!
//! 1. `Router`: the LLM picks relevant document ids, validated against the registry
//! 2. `Retriever`: per-document top-k similarity search
//! 3. `Reasoner`: one LLM call grounded on the retrieved chunks
//! 4. `ComplianceFilter`: redaction and disclaimer
//!
//! `Pipeline` runs the stages in order and short-circuits with
//! `QueryOutcome::NoRelevantInformation` when routing or retrieval comes back empty.

pub mod chunker;
pub mod compliance;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod loader;
pub mod pipeline;
pub mod reasoner;
pub mod registry;
pub mod retriever;
pub mod router;
pub mod startup;
mod timeout;
pub mod types;

#[cfg(test)]
mod tests;

pub use chunker::{chunk_document, split, ChunkerConfig, Chunks};
pub use compliance::ComplianceFilter;
pub use config::{load_config, save_config, CorpusConfig, RoutingFallback};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider, SimilarityMetric};
pub use index::{DocumentIndex, IndexOptions};
pub use loader::{DocumentLoader, SourceLoader};
pub use pipeline::Pipeline;
pub use reasoner::Reasoner;
pub use registry::{BuildReport, FailedDocument, IndexRegistry};
pub use retriever::Retriever;
pub use router::{parse_selection, Router};
pub use startup::{build_registry, create_llm, load_corpus, open_pipeline};
pub use types::{
    Answer, Chunk, QueryOutcome, RawDocument, RetrievedChunk, SourceKind, SourceRef,
    NO_RELEVANT_INFORMATION,
};
