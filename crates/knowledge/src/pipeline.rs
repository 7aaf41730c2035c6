//! Query orchestration: route, retrieve, reason, review.

use crate::compliance::ComplianceFilter;
use crate::config::RoutingFallback;
use crate::reasoner::Reasoner;
use crate::registry::IndexRegistry;
use crate::retriever::Retriever;
use crate::router::Router;
use crate::types::QueryOutcome;
use docqa_core::{AppError, AppResult};
use tracing::Instrument;

/// Default chunks retrieved per routed document.
pub const DEFAULT_TOP_K: usize = 5;

/// One query in, one reviewed answer (or the no-information outcome) out.
///
/// Holds no per-query state, so one pipeline can serve concurrent queries.
pub struct Pipeline {
    router: Router,
    retriever: Retriever,
    reasoner: Reasoner,
    compliance: ComplianceFilter,
    top_k: usize,
    routing_fallback: RoutingFallback,
}

impl Pipeline {
    pub fn new(
        router: Router,
        retriever: Retriever,
        reasoner: Reasoner,
        compliance: ComplianceFilter,
    ) -> Self {
        Self {
            router,
            retriever,
            reasoner,
            compliance,
            top_k: DEFAULT_TOP_K,
            routing_fallback: RoutingFallback::default(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> AppResult<Self> {
        if top_k == 0 {
            return Err(AppError::InvalidConfiguration(
                "top_k must be at least 1".to_string(),
            ));
        }
        self.top_k = top_k;
        Ok(self)
    }

    pub fn with_routing_fallback(mut self, fallback: RoutingFallback) -> Self {
        self.routing_fallback = fallback;
        self
    }

    pub fn registry(&self) -> &IndexRegistry {
        self.retriever.registry()
    }

    /// Answer `query` against the registry.
    ///
    /// Stages run strictly in order with no retries. The two empty outcomes
    /// (nothing routed, nothing retrieved) return
    /// `QueryOutcome::NoRelevantInformation`; every other failure is an error.
    pub async fn answer(&self, query: &str) -> AppResult<QueryOutcome> {
        let span = tracing::info_span!("query", id = %uuid::Uuid::new_v4());
        self.run(query).instrument(span).await
    }

    async fn run(&self, query: &str) -> AppResult<QueryOutcome> {
        tracing::debug!(query, "Received query");
        let known_ids = self.registry().keys();

        let document_ids = match self.router.route(query, &known_ids).await {
            Ok(ids) => ids,
            Err(e @ AppError::RoutingService(_))
                if self.routing_fallback == RoutingFallback::AllDocuments =>
            {
                tracing::warn!("Routing failed, searching all documents: {}", e);
                known_ids
            }
            Err(e) => return Err(e),
        };

        if document_ids.is_empty() {
            tracing::info!("No relevant documents routed");
            return Ok(QueryOutcome::NoRelevantInformation);
        }

        let chunks = self
            .retriever
            .retrieve(query, &document_ids, self.top_k)
            .await?;

        if chunks.is_empty() {
            tracing::info!("Routed documents yielded no chunks");
            return Ok(QueryOutcome::NoRelevantInformation);
        }

        let answer = self.reasoner.reason(query, &chunks).await?;
        let reviewed = self.compliance.review(answer);

        tracing::info!(sources = reviewed.sources.len(), "Reviewed answer");
        Ok(QueryOutcome::Answered(reviewed))
    }
}
