//! Ask command handler.
//!
//! Builds the document registry, answers one question and exits.

use clap::Args;
use docqa_core::{config::AppConfig, AppError, AppResult};
use docqa_knowledge::{open_pipeline, BuildReport, QueryOutcome};
use std::path::PathBuf;

/// Answer a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: Vec<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "query")]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        config.validate()?;

        let query = self.get_query()?;
        tracing::debug!("Query: {}", query);

        let (pipeline, report) = open_pipeline(config).await?;
        warn_failed(&report);

        let outcome = pipeline.answer(&query).await?;
        print_outcome(&outcome, self.json)
    }

    fn get_query(&self) -> AppResult<String> {
        let query = match &self.file {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                AppError::InvalidArgument(format!("Failed to read question file {:?}: {}", path, e))
            })?,
            None => self.query.join(" "),
        };

        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidArgument("No question provided".to_string()));
        }
        Ok(query.to_string())
    }
}

/// Print an outcome to stdout, as text or as a JSON object.
pub fn print_outcome(outcome: &QueryOutcome, json: bool) -> AppResult<()> {
    if json {
        let output = serde_json::json!({
            "status": match outcome {
                QueryOutcome::Answered(_) => "answered",
                QueryOutcome::NoRelevantInformation => "no_relevant_information",
            },
            "answer": outcome.text(),
            "sources": outcome.sources(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", outcome.text());
    }
    Ok(())
}

/// Tell the user which documents are unavailable for this session.
pub fn warn_failed(report: &BuildReport) {
    for failed in &report.failed {
        eprintln!(
            "warning: document '{}' unavailable ({}): {}",
            failed.document_id, failed.location, failed.error
        );
    }
}
