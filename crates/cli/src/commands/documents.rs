//! Documents command handler.
//!
//! Indexes the configured corpus without asking anything, to check that
//! every document loads and embeds.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::{build_registry, load_corpus};

/// Index the configured documents and report the result
#[derive(Args, Debug)]
pub struct DocumentsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DocumentsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing documents command");

        let corpus = load_corpus(config)?;
        let (registry, report) = build_registry(config, &corpus).await?;

        if self.json {
            let indexed: Vec<_> = registry
                .iter()
                .map(|(id, index)| {
                    serde_json::json!({
                        "id": id,
                        "location": corpus.documents.get(id),
                        "chunks": index.len(),
                        "dimensions": index.dimensions(),
                    })
                })
                .collect();
            let output = serde_json::json!({
                "indexed": indexed,
                "failed": report.failed,
                "durationSecs": report.duration.as_secs_f64(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if corpus.documents.is_empty() {
            println!("No documents configured.");
            return Ok(());
        }

        for (id, index) in registry.iter() {
            println!(
                "{:<24} {:>6} chunks  {}",
                id,
                index.len(),
                corpus.documents.get(id).map(String::as_str).unwrap_or("")
            );
        }
        for failed in &report.failed {
            println!("{:<24} FAILED  {}", failed.document_id, failed.error);
        }
        println!(
            "\nIndexed {} of {} documents in {:.2}s",
            report.indexed.len(),
            corpus.documents.len(),
            report.duration.as_secs_f64()
        );

        Ok(())
    }
}
