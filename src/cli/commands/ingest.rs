//! Ingest command: extract passages without calling any provider.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::ingest::{summarize, PassageSource, PdfIngestor};
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let ingestor = PdfIngestor::new(settings.document_paths());

    let spinner = Output::spinner("Extracting text...");
    let result = ingestor.load().await;
    spinner.finish_and_clear();

    let passages = match result {
        Ok(passages) => passages,
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    };

    Output::header("Documents");
    for (source, count) in summarize(&passages) {
        Output::kv(&source, &format!("{} passages", count));
    }
    println!();

    let characters: usize = passages.iter().map(|p| p.content.chars().count()).sum();
    Output::success(&format!(
        "Extracted {} passages ({} characters)",
        passages.len(),
        characters
    ));

    Ok(())
}
