//! Models command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::{create_llm, load_corpus};
use docqa_llm::LlmClient;

/// List models offered by the LLM provider
#[derive(Args, Debug)]
pub struct ModelsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ModelsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing models command for provider '{}'", config.provider);
        config.validate()?;

        let corpus = load_corpus(config)?;
        let client = create_llm(config, corpus.request_timeout())?;
        let models = client.list_models().await?;

        if self.json {
            let output = serde_json::json!({
                "provider": client.provider_name(),
                "active": config.model,
                "models": models,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for model in &models {
                let marker = if *model == config.model { "*" } else { " " };
                println!("{} {}", marker, model);
            }
        }

        Ok(())
    }
}
