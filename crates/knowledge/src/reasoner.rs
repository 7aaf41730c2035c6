//! Answer composition from retrieved chunks.

use crate::timeout::with_deadline;
use crate::types::{Answer, RetrievedChunk, SourceRef};
use docqa_core::{AppError, AppResult};
use docqa_llm::{LlmClient, LlmRequest};
use docqa_prompt::{build_prompt, PromptDefinition};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Separator placed between chunks in the grounding context.
pub const CHUNK_DELIMITER: &str = "\n\n---\n\n";

const SNIPPET_CHARS: usize = 160;

pub struct Reasoner {
    llm: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
    timeout: Duration,
}

impl Reasoner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        prompt: PromptDefinition,
        timeout: Duration,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            prompt,
            timeout,
        }
    }

    /// One LLM call grounded on `chunks` in the order given. Not retried.
    pub async fn reason(&self, query: &str, chunks: &[RetrievedChunk]) -> AppResult<Answer> {
        let mut variables = HashMap::new();
        variables.insert("context".to_string(), build_context(chunks));
        variables.insert("query".to_string(), query.to_string());
        let built = build_prompt(&self.prompt, variables)?;

        tracing::debug!(prompt = %built.user, "Reasoner prompt");

        let mut request = LlmRequest::new(built.user, &self.model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = with_deadline(
            self.timeout,
            "reasoning request",
            AppError::ReasoningService,
            async {
                self.llm
                    .complete(&request)
                    .await
                    .map_err(|e| AppError::ReasoningService(e.to_string()))
            },
        )
        .await?;

        tracing::info!(
            chunks = chunks.len(),
            answer_chars = response.content.len(),
            tokens = response.usage.total_tokens,
            "Composed answer"
        );

        Ok(Answer {
            text: response.content,
            sources: collect_sources(chunks),
        })
    }
}

/// Label each chunk with its source and join them with `CHUNK_DELIMITER`.
pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|retrieved| {
            let chunk = &retrieved.chunk;
            match chunk.page() {
                Some(page) => format!("[Source: {}, page {}]\n{}", chunk.document_id, page, chunk.text),
                None => format!("[Source: {}]\n{}", chunk.document_id, chunk.text),
            }
        })
        .collect::<Vec<_>>()
        .join(CHUNK_DELIMITER)
}

/// One reference per distinct (document, location), in chunk order.
fn collect_sources(chunks: &[RetrievedChunk]) -> Vec<SourceRef> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for retrieved in chunks {
        let chunk = &retrieved.chunk;
        let location = match chunk.page() {
            Some(page) => format!("page {}", page),
            None => format!("chunk {}", chunk.sequence_index),
        };

        if seen.insert((chunk.document_id.clone(), location.clone())) {
            sources.push(SourceRef {
                document_id: chunk.document_id.clone(),
                location,
                snippet: snippet(&chunk.text),
            });
        }
    }

    sources
}

fn snippet(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= SNIPPET_CHARS {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}
