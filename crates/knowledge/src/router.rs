//! LLM-driven document routing.
//!
//! The model's reply is untrusted input: it is split into candidate ids and
//! every candidate that is not a known document id is dropped silently.

use crate::timeout::with_deadline;
use docqa_core::{AppError, AppResult};
use docqa_llm::{LlmClient, LlmRequest};
use docqa_prompt::{build_prompt, PromptDefinition};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

pub struct Router {
    llm: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
    timeout: Duration,
}

impl Router {
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

    /// Ask the model which of `known_ids` are relevant to `query`.
    ///
    /// The result is a duplicate-free subset of `known_ids` in the order the
    /// model named them. An empty result is a normal outcome.
    pub async fn route(&self, query: &str, known_ids: &[String]) -> AppResult<Vec<String>> {
        if known_ids.is_empty() {
            tracing::debug!("No documents to route to");
            return Ok(Vec::new());
        }

        let mut variables = HashMap::new();
        variables.insert("documents".to_string(), known_ids.join(", "));
        variables.insert("query".to_string(), query.to_string());
        let built = build_prompt(&self.prompt, variables)?;

        let mut request = LlmRequest::new(built.user, &self.model).with_temperature(0.0);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = with_deadline(
            self.timeout,
            "routing request",
            AppError::RoutingService,
            async {
                self.llm
                    .complete(&request)
                    .await
                    .map_err(|e| AppError::RoutingService(e.to_string()))
            },
        )
        .await?;

        tracing::debug!(response = %response.content, "Router reply");

        let selected = parse_selection(&response.content, known_ids);
        tracing::info!(
            selected = ?selected,
            candidates = known_ids.len(),
            "Routed query"
        );
        Ok(selected)
    }
}

/// Keep the known ids named in `reply`, first mention wins.
///
/// Entries are separated by commas or newlines; surrounding whitespace,
/// quotes, brackets, backticks, list bullets and trailing periods are ignored.
pub fn parse_selection(reply: &str, known_ids: &[String]) -> Vec<String> {
    let known: HashSet<&str> = known_ids.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut selected = Vec::new();

    for candidate in reply.split([',', '\n']) {
        let candidate = candidate
            .trim()
            .trim_start_matches(['-', '*'])
            .trim_matches(|c: char| {
                c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '[' | ']' | '.')
            });

        if let Some(id) = known.get(candidate) {
            if seen.insert(*id) {
                selected.push(id.to_string());
            }
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::{router_prompt, ScriptedLlm};

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_plain_list() {
        let known = ids(&["HR_Handbook", "Sales_Playbook", "Engineering_SOPs"]);
        assert_eq!(
            parse_selection("HR_Handbook, Engineering_SOPs", &known),
            ids(&["HR_Handbook", "Engineering_SOPs"])
        );
    }

    #[test]
    fn test_parse_drops_hallucinations_and_duplicates() {
        let known = ids(&["A", "B"]);
        assert_eq!(
            parse_selection("B, Z, A, B,, nonsense text", &known),
            ids(&["B", "A"])
        );
    }

    #[test]
    fn test_parse_tolerates_decoration() {
        let known = ids(&["HR_Handbook", "Sales_Playbook"]);
        let reply = "[\"HR_Handbook\", `Sales_Playbook`].";
        assert_eq!(parse_selection(reply, &known), known);

        let bullets = "- HR_Handbook\n* Sales_Playbook\n";
        assert_eq!(parse_selection(bullets, &known), known);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        let known = ids(&["HR_Handbook"]);
        assert!(parse_selection("hr_handbook", &known).is_empty());
    }

    #[test]
    fn test_parse_output_is_subset() {
        let known = ids(&["A", "B", "C"]);
        let replies = [
            "",
            "none",
            "A,A,A",
            "D, E, F",
            "C\nB\nA\nC",
            "A B C",
            ",,,\n\n",
        ];

        for reply in replies {
            let selected = parse_selection(reply, &known);
            assert!(selected.iter().all(|id| known.contains(id)), "{}", reply);
            let unique: HashSet<_> = selected.iter().collect();
            assert_eq!(unique.len(), selected.len());
        }
    }

    #[tokio::test]
    async fn test_route_prompt_lists_documents() {
        let llm = Arc::new(ScriptedLlm::replying("A"));
        let router = Router::new(llm.clone(), "test-model", router_prompt(), Duration::from_secs(5));

        let routed = router.route("what are cats", &ids(&["A", "B"])).await.unwrap();
        assert_eq!(routed, ids(&["A"]));

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Available documents: A, B"));
        assert!(prompts[0].contains("Query: what are cats"));
    }

    #[tokio::test]
    async fn test_route_without_documents_skips_llm() {
        let llm = Arc::new(ScriptedLlm::replying("A"));
        let router = Router::new(llm.clone(), "test-model", router_prompt(), Duration::from_secs(5));

        assert!(router.route("anything", &[]).await.unwrap().is_empty());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_route_llm_failure_is_routing_error() {
        let llm = Arc::new(ScriptedLlm::failing());
        let router = Router::new(llm, "test-model", router_prompt(), Duration::from_secs(5));

        assert!(matches!(
            router.route("q", &ids(&["A"])).await,
            Err(AppError::RoutingService(_))
        ));
    }

    #[tokio::test]
    async fn test_route_timeout_is_routing_error() {
        let llm = Arc::new(ScriptedLlm::replying("A").with_delay(Duration::from_secs(5)));
        let router = Router::new(llm, "test-model", router_prompt(), Duration::from_millis(20));

        assert!(matches!(
            router.route("q", &ids(&["A"])).await,
            Err(AppError::RoutingService(_))
        ));
    }
}
