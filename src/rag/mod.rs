//! RAG (Retrieval-Augmented Generation) for question answering over the indexed documents.

pub mod context;
mod synthesizer;

pub use context::{RetrievedContext, Retriever};
pub use synthesizer::Synthesizer;

use crate::index::ScoredPassage;

/// A generated answer with the passages it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    /// The generated answer.
    pub text: String,
    /// Passages used for the answer, best first.
    pub sources: Vec<ScoredPassage>,
}
