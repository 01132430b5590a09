//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, top_k: Option<usize>, mut settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'consulta doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(k) = top_k {
        settings.retrieval.top_k = k;
    }

    let orchestrator = Orchestrator::new(&settings)?;

    let spinner = Output::spinner("Reading documents and thinking...");

    match orchestrator.ask(question).await {
        Ok(answer) => {
            spinner.finish_and_clear();

            println!("\n{}\n", answer.text);

            if !answer.sources.is_empty() {
                Output::header("Sources");
                for (i, source) in answer.sources.iter().enumerate() {
                    Output::passage(i + 1, &source.passage.location(), source.score, &source.passage.content, 100);
                }
            } else {
                Output::warning("No relevant passages were found in the documents.");
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
