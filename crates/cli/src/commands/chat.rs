//! Chat command handler.
//!
//! Builds the registry once, then answers questions read from stdin until
//! `exit`, `quit` or end of input.

use super::ask::{print_outcome, warn_failed};
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_knowledge::open_pipeline;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive question loop
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Print each answer as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");
        config.validate()?;

        let (pipeline, report) = open_pipeline(config).await?;
        warn_failed(&report);
        eprintln!(
            "Indexed {} documents: {}. Type 'exit' to quit.",
            report.indexed.len(),
            report.indexed.join(", ")
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            prompt()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };

            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if is_exit(query) {
                break;
            }

            // A failed query is reported and the session continues.
            match pipeline.answer(query).await {
                Ok(outcome) => print_outcome(&outcome, self.json)?,
                Err(e) => {
                    tracing::error!("Query failed: {}", e);
                    eprintln!("error: {}", e);
                }
            }
        }

        Ok(())
    }
}

fn prompt() -> AppResult<()> {
    let mut stderr = std::io::stderr();
    write!(stderr, "\nAsk: ")?;
    stderr.flush()?;
    Ok(())
}

fn is_exit(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}
