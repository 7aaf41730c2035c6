//! Deterministic stand-ins for the LLM, embedding and loading services.

use crate::embeddings::EmbeddingProvider;
use crate::loader::DocumentLoader;
use crate::types::{Chunk, RawDocument, SourceKind};
use async_trait::async_trait;
use docqa_core::{AppError, AppResult};
use docqa_llm::{LlmClient, LlmRequest, LlmResponse};
use docqa_prompt::builtin::builtin;
use docqa_prompt::{PromptDefinition, REASONER_ANSWER, ROUTER_SELECT};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn router_prompt() -> PromptDefinition {
    builtin(ROUTER_SELECT).unwrap().unwrap()
}

pub fn reasoner_prompt() -> PromptDefinition {
    builtin(REASONER_ANSWER).unwrap().unwrap()
}

pub fn chunk(document_id: &str, sequence_index: usize, text: &str) -> Chunk {
    Chunk {
        document_id: document_id.to_string(),
        text: text.to_string(),
        sequence_index,
        metadata: BTreeMap::new(),
    }
}

/// LLM stub with one canned reply per stage. `None` makes that stage fail.
///
/// Router prompts are recognised by their "Available documents:" line.
pub struct ScriptedLlm {
    route_reply: Option<String>,
    answer_reply: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn stages(route_reply: Option<&str>, answer_reply: Option<&str>) -> Self {
        Self {
            route_reply: route_reply.map(str::to_string),
            answer_reply: answer_reply.map(str::to_string),
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: &str) -> Self {
        Self::stages(Some(reply), Some(reply))
    }

    pub fn failing() -> Self {
        Self::stages(None, None)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = if request.prompt.contains("Available documents:") {
            &self.route_reply
        } else {
            &self.answer_reply
        };

        match reply {
            Some(text) => Ok(LlmResponse::text(text.clone(), request.model.clone())),
            None => Err(AppError::Llm("connection refused".to_string())),
        }
    }

    async fn list_models(&self) -> AppResult<Vec<String>> {
        Ok(vec!["scripted-model".to_string()])
    }
}

/// Embedder returning table vectors per exact text, counting every call.
#[derive(Debug)]
pub struct StubEmbedder {
    dimensions: usize,
    table: HashMap<String, Vec<f32>>,
    fallback: Option<Vec<f32>>,
    fail: bool,
    delay: Option<Duration>,
    delay_per_text: Option<Duration>,
    calls: AtomicUsize,
}

impl StubEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            table: HashMap::new(),
            fallback: None,
            fail: false,
            delay: None,
            delay_per_text: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }

    /// Vector for any text missing from the table (zeros otherwise).
    pub fn with_default(mut self, vector: Vec<f32>) -> Self {
        self.fallback = Some(vector);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep once per text, like a provider that sends one request per text.
    pub fn with_delay_per_text(mut self, delay: Duration) -> Self {
        self.delay_per_text = Some(delay);
        self
    }

    /// Number of `embed_batch` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    fn provider_name(&self) -> &str {
        "stub"
    }

    fn model_name(&self) -> &str {
        "stub-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(delay) = self.delay_per_text {
            for _ in texts {
                tokio::time::sleep(delay).await;
            }
        }
        if self.fail {
            return Err(AppError::EmbeddingService("embedding backend offline".to_string()));
        }

        Ok(texts
            .iter()
            .map(|text| {
                self.table
                    .get(text)
                    .or(self.fallback.as_ref())
                    .cloned()
                    .unwrap_or_else(|| vec![0.0; self.dimensions])
            })
            .collect())
    }
}

/// Loader serving documents from memory by id.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    documents: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, content: &str) -> Self {
        self.documents.insert(id.to_string(), content.to_string());
        self
    }
}

#[async_trait]
impl DocumentLoader for MemoryLoader {
    async fn load(&self, id: &str, location: &str) -> AppResult<RawDocument> {
        let content = self
            .documents
            .get(id)
            .ok_or_else(|| AppError::DocumentLoad(format!("{} not found", location)))?;

        let mut document = RawDocument::from_text(id, content.clone(), SourceKind::File);
        document.location = location.to_string();
        Ok(document)
    }
}
