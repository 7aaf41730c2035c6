//! End-to-end query scenarios against a two-document corpus.

use super::support::{reasoner_prompt, router_prompt, MemoryLoader, ScriptedLlm, StubEmbedder};
use crate::chunker::ChunkerConfig;
use crate::compliance::{ComplianceFilter, DISCLAIMER};
use crate::config::RoutingFallback;
use crate::index::IndexOptions;
use crate::pipeline::Pipeline;
use crate::reasoner::Reasoner;
use crate::registry::IndexRegistry;
use crate::retriever::Retriever;
use crate::router::Router;
use crate::types::{QueryOutcome, NO_RELEVANT_INFORMATION};
use docqa_core::AppError;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    pipeline: Pipeline,
    llm: Arc<ScriptedLlm>,
    embedder: Arc<StubEmbedder>,
}

async fn fixture(llm: ScriptedLlm, fallback: RoutingFallback) -> Fixture {
    fixture_with_corpus(
        llm,
        fallback,
        &[("A", "cats are mammals"), ("B", "rockets use fuel")],
    )
    .await
}

async fn fixture_with_corpus(
    llm: ScriptedLlm,
    fallback: RoutingFallback,
    corpus: &[(&str, &str)],
) -> Fixture {
    let llm = Arc::new(llm);
    let embedder = Arc::new(StubEmbedder::new(2).with_default(vec![1.0, 0.0]));

    let mut loader = MemoryLoader::new();
    let mut documents = BTreeMap::new();
    for (id, content) in corpus {
        loader = loader.with(id, content);
        documents.insert(id.to_string(), format!("memory://{}", id));
    }

    let (registry, report) = IndexRegistry::build(
        &documents,
        &loader,
        ChunkerConfig::new(1000, 100).unwrap(),
        embedder.clone(),
        IndexOptions::default(),
        2,
    )
    .await
    .unwrap();
    assert!(report.is_complete());

    let timeout = Duration::from_secs(5);
    let pipeline = Pipeline::new(
        Router::new(llm.clone(), "test-model", router_prompt(), timeout),
        Retriever::new(registry),
        Reasoner::new(llm.clone(), "test-model", reasoner_prompt(), timeout),
        ComplianceFilter::default(),
    )
    .with_routing_fallback(fallback);

    Fixture {
        pipeline,
        llm,
        embedder,
    }
}

fn cats_llm() -> ScriptedLlm {
    ScriptedLlm::stages(Some("A"), Some("Cats are mammals. [Source: A]"))
}

#[tokio::test]
async fn test_cats_question_end_to_end() {
    let fx = fixture(cats_llm(), RoutingFallback::Fail).await;

    let outcome = fx.pipeline.answer("what are cats classified as").await.unwrap();

    assert_eq!(
        outcome.text(),
        format!("Cats are mammals. [Source: A]{}", DISCLAIMER)
    );
    assert_eq!(
        outcome.text(),
        "Cats are mammals. [Source: A]\n\n[Note: This response is generated based on provided documents and may not replace official policies.]"
    );
    assert_eq!(outcome.sources().len(), 1);
    assert_eq!(outcome.sources()[0].document_id, "A");

    let prompts = fx.llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("cats are mammals"));
    assert!(!prompts[1].contains("rockets use fuel"));
}

#[tokio::test]
async fn test_empty_routing_short_circuits() {
    let fx = fixture(
        ScriptedLlm::stages(Some("None of these documents are relevant."), Some("unused")),
        RoutingFallback::Fail,
    )
    .await;
    let embed_calls_after_build = fx.embedder.calls();

    let outcome = fx.pipeline.answer("what is the capital of France").await.unwrap();

    assert_eq!(outcome, QueryOutcome::NoRelevantInformation);
    assert_eq!(outcome.text(), NO_RELEVANT_INFORMATION);
    assert_eq!(fx.llm.calls(), 1);
    assert_eq!(fx.embedder.calls(), embed_calls_after_build);
}

#[tokio::test]
async fn test_repeated_queries_are_identical() {
    let fx = fixture(cats_llm(), RoutingFallback::Fail).await;

    let first = fx.pipeline.answer("what are cats classified as").await.unwrap();
    let second = fx.pipeline.answer("what are cats classified as").await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_concurrent_queries_share_registry() {
    let fx = fixture(cats_llm(), RoutingFallback::Fail).await;

    let (a, b) = tokio::join!(
        fx.pipeline.answer("what are cats"),
        fx.pipeline.answer("are cats mammals")
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(fx.llm.calls(), 4);
}

#[tokio::test]
async fn test_hallucinated_ids_are_ignored() {
    let fx = fixture(
        ScriptedLlm::stages(Some("Z, A, Zoology_Notes"), Some("Cats are mammals.")),
        RoutingFallback::Fail,
    )
    .await;

    let outcome = fx.pipeline.answer("cats?").await.unwrap();
    let sources: Vec<_> = outcome.sources().iter().map(|s| s.document_id.as_str()).collect();
    assert_eq!(sources, vec!["A"]);
}

#[tokio::test]
async fn test_routing_failure_is_fatal_by_default() {
    let fx = fixture(
        ScriptedLlm::stages(None, Some("unused")),
        RoutingFallback::Fail,
    )
    .await;

    let result = fx.pipeline.answer("cats?").await;
    assert!(matches!(result, Err(AppError::RoutingService(_))));
    assert_eq!(fx.llm.calls(), 1);
}

#[tokio::test]
async fn test_routing_failure_can_fall_back_to_all_documents() {
    let fx = fixture(
        ScriptedLlm::stages(None, Some("Both documents apply.")),
        RoutingFallback::AllDocuments,
    )
    .await;

    let outcome = fx.pipeline.answer("cats or rockets?").await.unwrap();
    let sources: Vec<_> = outcome.sources().iter().map(|s| s.document_id.as_str()).collect();
    assert_eq!(sources, vec!["A", "B"]);

    let reasoner_prompt = &fx.llm.prompts()[1];
    assert!(reasoner_prompt.contains("cats are mammals"));
    assert!(reasoner_prompt.contains("rockets use fuel"));
}

#[tokio::test]
async fn test_reasoning_failure_propagates() {
    let fx = fixture(ScriptedLlm::stages(Some("A"), None), RoutingFallback::Fail).await;

    let result = fx.pipeline.answer("cats?").await;
    assert!(matches!(result, Err(AppError::ReasoningService(_))));
    assert_eq!(fx.llm.calls(), 2);
}

#[tokio::test]
async fn test_empty_document_yields_no_information() {
    let fx = fixture_with_corpus(
        ScriptedLlm::stages(Some("Blank"), Some("unused")),
        RoutingFallback::Fail,
        &[("Blank", ""), ("A", "cats are mammals")],
    )
    .await;

    let outcome = fx.pipeline.answer("anything").await.unwrap();
    assert_eq!(outcome, QueryOutcome::NoRelevantInformation);
    assert_eq!(fx.llm.calls(), 1);
}

#[tokio::test]
async fn test_answer_is_redacted() {
    let fx = fixture(
        ScriptedLlm::stages(Some("A"), Some("The cat census is confidential.")),
        RoutingFallback::Fail,
    )
    .await;

    let outcome = fx.pipeline.answer("how many cats").await.unwrap();
    assert!(outcome.text().starts_with("The cat census is [REDACTED]."));
    assert!(outcome.text().ends_with(DISCLAIMER));
}

#[tokio::test]
async fn test_top_k_limits_chunks_per_document() {
    let llm = ScriptedLlm::stages(Some("Long"), Some("ok"));
    let long_text = "x".repeat(2500);
    let fx = fixture_with_corpus(llm, RoutingFallback::Fail, &[("Long", long_text.as_str())]).await;

    let default_outcome = fx.pipeline.answer("x").await.unwrap();
    assert_eq!(default_outcome.sources().len(), 3);

    let pipeline = Pipeline::new(
        Router::new(fx.llm.clone(), "m", router_prompt(), Duration::from_secs(5)),
        Retriever::new(fx.pipeline.registry().clone()),
        Reasoner::new(fx.llm.clone(), "m", reasoner_prompt(), Duration::from_secs(5)),
        ComplianceFilter::default(),
    )
    .with_top_k(1)
    .unwrap();

    let outcome = pipeline.answer("x").await.unwrap();
    assert_eq!(outcome.sources().len(), 1);
    assert!(Pipeline::new(
        Router::new(fx.llm.clone(), "m", router_prompt(), Duration::from_secs(5)),
        Retriever::new(IndexRegistry::default()),
        Reasoner::new(fx.llm.clone(), "m", reasoner_prompt(), Duration::from_secs(5)),
        ComplianceFilter::default(),
    )
    .with_top_k(0)
    .is_err());
}
