//! Prompt definitions compiled into the binary.
//!
//! A workspace can replace either one by dropping a file with the same id
//! into `.docqa/prompts/`.

use crate::types::PromptDefinition;
use docqa_core::{AppError, AppResult};

/// Id of the document-selection prompt.
pub const ROUTER_SELECT: &str = "router.select";

/// Id of the grounded-answer prompt.
pub const REASONER_ANSWER: &str = "reasoner.answer";

const ROUTER_SELECT_YAML: &str = r#"
id: router.select
title: Select relevant documents
apiVersion: "1.0"
createdBy: docqa
variables: [documents, query]
template: |-
  You are a router deciding relevant documents for the query.
  Available documents: {{documents}}
  Query: {{query}}
  Respond with a comma-separated list of relevant document IDs only.
output:
  format: csv
"#;

const REASONER_ANSWER_YAML: &str = r#"
id: reasoner.answer
title: Answer from document sections
apiVersion: "1.0"
createdBy: docqa
variables: [context, query]
template: |-
  You are an expert AI assistant. Use the following extracted document sections to answer the question:

  {{context}}

  Question: {{query}}
  Answer, referencing the document sources (include page numbers if available).
output:
  format: text
"#;

/// Ids of every built-in prompt.
pub fn builtin_ids() -> [&'static str; 2] {
    [ROUTER_SELECT, REASONER_ANSWER]
}

/// Parse the built-in definition for `id`, if there is one.
pub fn builtin(id: &str) -> Option<AppResult<PromptDefinition>> {
    let yaml = match id {
        ROUTER_SELECT => ROUTER_SELECT_YAML,
        REASONER_ANSWER => REASONER_ANSWER_YAML,
        _ => return None,
    };

    Some(serde_yaml::from_str(yaml).map_err(|e| {
        AppError::Prompt(format!("Built-in prompt '{}' is invalid: {}", id, e))
    }))
}
