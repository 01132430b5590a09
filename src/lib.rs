//! Consulta - Questions and answers over PDF documents
//!
//! Indexes a fixed set of PDF documents and answers natural-language
//! questions about them with a hosted LLM, using only the passages most
//! relevant to each question.
//!
//! # Overview
//!
//! Consulta:
//! - Extracts one passage per PDF page
//! - Embeds every passage once, on the first question, and keeps the index in memory
//! - Retrieves the passages closest to a question by cosine similarity
//! - Asks the LLM to answer from those passages only
//! - Serves a small chat UI and a `POST /ask` endpoint
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `ingest` - PDF text extraction into passages
//! - `embedding` - Embedding providers (OpenAI, Gemini)
//! - `completion` - Chat completion providers (OpenAI, Gemini)
//! - `retry` - Bounded retry with backoff for provider calls
//! - `index` - In-memory vector index and its build lifecycle
//! - `rag` - Retrieval and answer synthesis
//! - `orchestrator` - Question pipeline coordination
//! - `cli` - Command-line interface and HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use consulta::config::Settings;
//! use consulta::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings)?;
//!
//!     let answer = orchestrator.ask("¿Qué propone el plan sobre educación?").await?;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod error;
pub mod gemini;
pub mod index;
pub mod ingest;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod retry;

#[cfg(test)]
mod testing;

pub use error::{ConsultaError, Result};
