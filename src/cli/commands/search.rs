//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, top_k: usize, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'consulta doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(&settings)?;

    let spinner = Output::spinner("Searching...");

    let results = orchestrator.retrieve(query, top_k).await;
    spinner.finish_and_clear();

    match results {
        Ok(context) => {
            if context.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", context.len()));

                for (i, scored) in context.passages.iter().enumerate() {
                    Output::passage(i + 1, &scored.passage.location(), scored.score, &scored.passage.content, 200);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
