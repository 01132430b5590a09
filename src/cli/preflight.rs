//! Pre-flight checks before expensive operations.
//!
//! Validates that API keys and source documents are available before
//! starting operations that would otherwise fail on the first question.

use crate::config::Settings;
use crate::error::{ConsultaError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering needs both providers and the documents.
    Ask,
    /// Retrieval needs the embedding provider and the documents.
    Search,
    /// Ingestion only reads the documents.
    Ingest,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask => {
            check_api_key(&settings.embedding.api_key_env())?;
            check_api_key(&settings.completion.api_key_env())?;
            check_documents(settings)?;
        }
        Operation::Search => {
            check_api_key(&settings.embedding.api_key_env())?;
            check_documents(settings)?;
        }
        Operation::Ingest => {
            check_documents(settings)?;
        }
    }
    Ok(())
}

/// Check that the named API key variable is set.
fn check_api_key(env_name: &str) -> Result<()> {
    Settings::api_key(env_name).map(|_| ()).map_err(|_| {
        ConsultaError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            env_name, env_name
        ))
    })
}

/// Check that every configured document exists.
fn check_documents(settings: &Settings) -> Result<()> {
    let paths = settings.document_paths();
    if paths.is_empty() {
        return Err(ConsultaError::Config(
            "No documents configured (documents.paths is empty)".to_string(),
        ));
    }
    if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
        return Err(ConsultaError::Config(format!(
            "Document not found: {}",
            missing.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ingest_requires_existing_documents() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("pt_adn.pdf");
        std::fs::write(&present, b"%PDF-1.5").unwrap();

        let mut settings = Settings::default();
        settings.documents.paths = vec![present.display().to_string()];
        assert!(check(Operation::Ingest, &settings).is_ok());

        settings.documents.paths.push(dir.path().join("missing.pdf").display().to_string());
        let err = check(Operation::Ingest, &settings).unwrap_err();
        assert!(err.to_string().contains("missing.pdf"));
    }

    #[test]
    fn test_no_documents_configured() {
        let mut settings = Settings::default();
        settings.documents.paths.clear();
        assert!(check(Operation::Ingest, &settings).is_err());
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let err = check_api_key("CONSULTA_TEST_UNSET_KEY").unwrap_err();
        assert!(err.to_string().contains("CONSULTA_TEST_UNSET_KEY"));
    }
}
