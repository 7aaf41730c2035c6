//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Every variable the definition declares must be supplied. Values are
/// inserted verbatim: no HTML escaping, and a value containing `{{` is not
/// re-interpreted as template syntax.
///
/// # Example
/// ```no_run
/// use docqa_prompt::{build_prompt, load_prompt};
/// use std::collections::HashMap;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_prompt(Path::new("."), "router.select")?;
/// let mut vars = HashMap::new();
/// vars.insert("documents".to_string(), "HR_Handbook, Sales_Playbook".to_string());
/// vars.insert("query".to_string(), "How many vacation days?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    for required in &definition.variables {
        if !variables.contains_key(required) {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' requires variable '{}'",
                definition.id, required
            )));
        }
    }

    let user = render_template(&definition.template, &variables)?;

    let system = match definition.system {
        Some(ref system) => Some(render_template(system, &variables)?),
        None => None,
    };

    Ok(BuiltPrompt {
        prompt_id: definition.id.clone(),
        system,
        user,
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text output
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PromptOutputSpec;

    fn definition(template: &str, variables: &[&str]) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            system: None,
            variables: variables.iter().map(|v| v.to_string()).collect(),
            template: template.to_string(),
            output: PromptOutputSpec {
                format: "text".to_string(),
            },
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_simple_template() {
        let result = render_template("Question: {{query}}", &vars(&[("query", "Hello")]));
        assert_eq!(result.unwrap(), "Question: Hello");
    }

    #[test]
    fn test_values_are_not_escaped() {
        let result = render_template("{{query}}", &vars(&[("query", "<b>R&D</b>")]));
        assert_eq!(result.unwrap(), "<b>R&D</b>");
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        let result = render_template("{{query}}", &vars(&[("query", "{{context}}")]));
        assert_eq!(result.unwrap(), "{{context}}");
    }

    #[test]
    fn test_build_prompt_requires_declared_variables() {
        let def = definition("{{documents}} {{query}}", &["documents", "query"]);
        let err = build_prompt(&def, vars(&[("query", "q")])).unwrap_err();
        assert!(err.to_string().contains("documents"));
    }

    #[test]
    fn test_build_prompt_with_system() {
        let mut def = definition("Q: {{query}}", &["query"]);
        def.system = Some("Answer about {{query}} only.".to_string());

        let built = build_prompt(&def, vars(&[("query", "PTO")])).unwrap();
        assert_eq!(built.user, "Q: PTO");
        assert_eq!(built.system.as_deref(), Some("Answer about PTO only."));
        assert_eq!(built.prompt_id, "test.prompt");
    }

    #[test]
    fn test_strict_mode_rejects_undeclared_missing_variable() {
        let result = render_template("Question: {{missing}}", &HashMap::new());
        assert!(result.is_err());
    }
}
