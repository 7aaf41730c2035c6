//! Prompts command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_prompt::{list_prompts, load_prompt};

/// List available prompt definitions
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Print the template of this prompt instead of listing
    #[arg(long)]
    pub show: Option<String>,
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        if let Some(id) = &self.show {
            let prompt = load_prompt(&config.workspace, id)?;
            if let Some(system) = &prompt.system {
                println!("# system\n{}\n", system);
            }
            println!("{}", prompt.template);
            return Ok(());
        }

        for id in list_prompts(&config.workspace)? {
            let title = load_prompt(&config.workspace, &id)
                .map(|p| p.title)
                .unwrap_or_else(|e| format!("(invalid: {})", e));
            println!("{:<20} {}", id, title);
        }
        Ok(())
    }
}
