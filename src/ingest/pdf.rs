//! PDF ingestion: one passage per page.

use super::{Passage, PassageSource};
use crate::error::{ConsultaError, Result};
use async_trait::async_trait;
use lopdf::Document;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, instrument, warn};

static INLINE_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\x{00A0}]+").expect("Invalid regex"));
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("Invalid regex"));

/// Loads a fixed list of PDF files.
pub struct PdfIngestor {
    paths: Vec<PathBuf>,
}

impl PdfIngestor {
    /// Create an ingestor for the given files, kept in order.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

/// Collapse runs of inline whitespace and blank lines.
fn normalize(text: &str) -> String {
    let collapsed = INLINE_SPACE.replace_all(text, " ");
    let joined = collapsed.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    BLANK_LINES.replace_all(&joined, "\n\n").trim().to_string()
}

#[async_trait]
impl PassageSource for PdfIngestor {
    #[instrument(skip(self), fields(documents = self.paths.len()))]
    async fn load(&self) -> Result<Vec<Passage>> {
        let mut passages = Vec::new();

        for path in &self.paths {
            let owned = path.clone();
            let pages = tokio::task::spawn_blocking(move || extract_pages(&owned))
                .await
                .map_err(|e| load_error(path, format!("extraction task failed: {}", e)))??;

            let source = document_id(path);
            let before = passages.len();

            for (page, text) in pages {
                let text = normalize(&text);
                if text.is_empty() {
                    debug!(source = %source, page, "Skipping page without text");
                    continue;
                }
                passages.push(Passage::new(source.clone(), page, passages.len(), text));
            }

            if passages.len() == before {
                return Err(load_error(path, "no extractable text"));
            }

            info!("Loaded {} passages from {}", passages.len() - before, path.display());
        }

        Ok(passages)
    }
}

/// Extract the raw text of every page, keyed by 1-based page number.
fn extract_pages(path: &Path) -> Result<Vec<(u32, String)>> {
    let document = Document::load(path).map_err(|e| load_error(path, e.to_string()))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) => pages.push((*page_number, text)),
            Err(e) => warn!(
                "Could not extract text from page {} of {}: {}",
                page_number,
                path.display(),
                e
            ),
        }
    }

    Ok(pages)
}

fn document_id(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn load_error(path: &Path, message: impl Into<String>) -> ConsultaError {
    ConsultaError::DocumentLoad {
        path: path.to_path_buf(),
        message: message.into(),
    }
}
