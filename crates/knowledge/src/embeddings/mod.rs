//! Embedding service contract and providers.
//!
//! The core treats embedding as a black box: text in, fixed-length vector out.
//! Every failure a provider reports surfaces as `AppError::EmbeddingService`.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::{EmbeddingConfig, SimilarityMetric};
pub use provider::{create_provider, EmbeddingProvider};
