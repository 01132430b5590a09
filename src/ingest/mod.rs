//! Document ingestion: turning source PDFs into passages.

mod pdf;

pub use pdf::PdfIngestor;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A unit of extracted document text, one per PDF page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Document identifier (the file name of the source PDF).
    pub source: String,
    /// 1-based page number within the source.
    pub page: u32,
    /// Position across all ingested documents, starting at 0.
    pub ordinal: usize,
    /// Extracted text.
    pub content: String,
}

impl Passage {
    /// Create a new passage.
    pub fn new(source: impl Into<String>, page: u32, ordinal: usize, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            page,
            ordinal,
            content: content.into(),
        }
    }

    /// Short human-readable location, e.g. `pt_adn.pdf, page 3`.
    pub fn location(&self) -> String {
        format!("{}, page {}", self.source, self.page)
    }
}

/// Something that can produce the full passage set for an index build.
#[async_trait]
pub trait PassageSource: Send + Sync {
    /// Load every passage, in ingestion order.
    ///
    /// Either all documents load or the call fails; partial results are never returned.
    async fn load(&self) -> Result<Vec<Passage>>;
}

/// Per-document passage counts, in ingestion order.
pub fn summarize(passages: &[Passage]) -> Vec<(String, usize)> {
    let mut summary: Vec<(String, usize)> = Vec::new();
    for passage in passages {
        match summary.last_mut() {
            Some((source, count)) if *source == passage.source => *count += 1,
            _ => summary.push((passage.source.clone(), 1)),
        }
    }
    summary
}
