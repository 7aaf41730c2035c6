//! Wiring a pipeline from workspace configuration.

use crate::compliance::ComplianceFilter;
use crate::config::{load_config, resolve_location, CorpusConfig};
use crate::embeddings::create_provider;
use crate::loader::SourceLoader;
use crate::pipeline::Pipeline;
use crate::reasoner::Reasoner;
use crate::registry::{BuildReport, IndexRegistry};
use crate::retriever::Retriever;
use crate::router::Router;
use docqa_core::{AppConfig, AppError, AppResult};
use docqa_llm::{create_client, LlmClient};
use docqa_prompt::{load_prompt, REASONER_ANSWER, ROUTER_SELECT};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// The LLM client for `app`'s active provider.
///
/// The provider's own `timeout` wins over the corpus request timeout.
pub fn create_llm(app: &AppConfig, fallback_timeout: Duration) -> AppResult<Arc<dyn LlmClient>> {
    let timeout = app
        .timeout_secs()
        .map(Duration::from_secs)
        .unwrap_or(fallback_timeout);
    let endpoint = app.endpoint();
    let api_key = app.resolve_api_key(&app.provider);

    create_client(
        &app.provider,
        endpoint.as_deref(),
        api_key.as_deref(),
        Some(timeout),
    )
}

/// Load the corpus config for `app` and validate it.
pub fn load_corpus(app: &AppConfig) -> AppResult<CorpusConfig> {
    let corpus = load_config(&app.workspace)?;
    corpus.validate()?;
    Ok(corpus)
}

/// Index every configured document.
pub async fn build_registry(
    app: &AppConfig,
    corpus: &CorpusConfig,
) -> AppResult<(IndexRegistry, BuildReport)> {
    let api_key = app.resolve_api_key("openai");
    let embedder = create_provider(
        &corpus.embedding,
        api_key.as_deref(),
        Some(corpus.request_timeout()),
    )?;
    let loader = SourceLoader::new(corpus.request_timeout())?;

    let documents: BTreeMap<String, String> = corpus
        .documents
        .iter()
        .map(|(id, location)| (id.clone(), resolve_location(&app.workspace, location)))
        .collect();

    IndexRegistry::build(
        &documents,
        &loader,
        corpus.chunker()?,
        embedder,
        corpus.index_options(),
        corpus.build_concurrency,
    )
    .await
}

/// Build the registry and assemble a ready-to-query pipeline.
pub async fn open_pipeline(app: &AppConfig) -> AppResult<(Pipeline, BuildReport)> {
    let corpus = load_corpus(app)?;
    if corpus.documents.is_empty() {
        return Err(AppError::Config(format!(
            "No documents configured. Add a `documents:` map to {:?}",
            crate::config::get_config_path(&app.workspace)
        )));
    }

    let llm = create_llm(app, corpus.request_timeout())?;
    let router_prompt = load_prompt(&app.workspace, ROUTER_SELECT)?;
    let reasoner_prompt = load_prompt(&app.workspace, REASONER_ANSWER)?;

    let (registry, report) = build_registry(app, &corpus).await?;

    let timeout = corpus.request_timeout();
    let pipeline = Pipeline::new(
        Router::new(Arc::clone(&llm), &app.model, router_prompt, timeout),
        Retriever::new(registry),
        Reasoner::new(llm, &app.model, reasoner_prompt, timeout),
        ComplianceFilter::with_terms(corpus.compliance.redact.iter().cloned()),
    )
    .with_top_k(corpus.top_k)?
    .with_routing_fallback(corpus.routing_fallback);

    Ok((pipeline, report))
}
