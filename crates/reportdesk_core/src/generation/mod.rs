//! Text-generation collaborator contract.
//!
//! # Responsibility
//! - Define the draft/summarize port consumed by assist workflows.
//! - Classify collaborator failures without leaking transport types.
//!
//! # Invariants
//! - Implementations are stateless from the store's perspective.
//! - A successful call never returns blank text.

use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod openai;

pub use openai::OpenAiTextGenerator;

pub type GenerationResult<T> = Result<T, GenerationError>;

/// Failure of one text-generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// No API key is configured.
    MissingApiKey,
    /// The call did not complete within the configured timeout.
    Timeout,
    /// Connection or protocol failure before a response arrived.
    Transport(String),
    /// Non-success HTTP status.
    Status { code: u16, body: String },
    /// Response arrived but carried no usable text.
    InvalidResponse(String),
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "text generation is not configured: missing API key"),
            Self::Timeout => write!(f, "text generation timed out"),
            Self::Transport(details) => write!(f, "text generation request failed: {details}"),
            Self::Status { code, body } => {
                write!(f, "text generation service returned {code}: {body}")
            }
            Self::InvalidResponse(details) => {
                write!(f, "text generation response is invalid: {details}")
            }
        }
    }
}

impl Error for GenerationError {}

/// Drafts and summarizes report text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Writes a report draft for `title`.
    async fn generate_draft(&self, title: &str) -> GenerationResult<String>;
    /// Condenses `content` into a summary.
    async fn summarize_content(&self, content: &str) -> GenerationResult<String>;
}
