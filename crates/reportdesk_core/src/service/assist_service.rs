//! Draft and summarize workflows.
//!
//! # Responsibility
//! - Run text-generation calls for a report without holding the store.
//! - Apply results through store operations only after the call succeeds.
//!
//! # Invariants
//! - A failed call leaves the report's content and history untouched.
//! - No call is retried; callers decide whether to try again.
//! - The store lock is never held across an `.await`.

use crate::generation::{GenerationError, TextGenerator};
use crate::model::report::{Report, ReportId, ReportPatch};
use crate::store::activity::{GENERATED_DRAFT, SUMMARIZED_CONTENT};
use crate::store::report_store::StoreError;
use crate::store::shared::SharedReportStore;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which assist workflow failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistOperation {
    Draft,
    Summarize,
}

impl AssistOperation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Summarize => "summarize",
        }
    }
}

/// Service error for assist workflows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistError {
    /// Draft requested for a blank title.
    EmptyTitle,
    /// Summary requested for blank content.
    EmptyContent,
    /// Report missing before the call or deleted while it ran.
    ReportNotFound(ReportId),
    /// The text-generation collaborator failed.
    Generation {
        operation: AssistOperation,
        source: GenerationError,
    },
}

impl AssistError {
    /// Message suitable for showing to the person at the keyboard.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "Please enter a title before generating a draft",
            Self::EmptyContent => "Please add some content before summarizing",
            Self::ReportNotFound(_) => "The report no longer exists",
            Self::Generation {
                operation: AssistOperation::Draft,
                ..
            } => "Failed to generate draft. Please try again later.",
            Self::Generation {
                operation: AssistOperation::Summarize,
                ..
            } => "Failed to summarize content. Please try again later.",
        }
    }
}

impl Display for AssistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "report title is empty"),
            Self::EmptyContent => write!(f, "report content is empty"),
            Self::ReportNotFound(id) => write!(f, "report not found: {id}"),
            Self::Generation { operation, source } => {
                write!(f, "{} failed: {source}", operation.as_str())
            }
        }
    }
}

impl Error for AssistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Generation { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<StoreError> for AssistError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::ReportNotFound(id),
        }
    }
}

/// Assist workflows over one text generator.
pub struct AssistService<G: TextGenerator> {
    generator: G,
}

impl<G: TextGenerator> AssistService<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Generates a draft for an unsaved title.
    pub async fn draft_for_title(&self, title: &str) -> Result<String, AssistError> {
        if title.trim().is_empty() {
            return Err(AssistError::EmptyTitle);
        }
        self.generator
            .generate_draft(title)
            .await
            .map_err(|source| generation_failed(AssistOperation::Draft, source))
    }

    /// Summarizes unsaved content.
    pub async fn summary_for_content(&self, content: &str) -> Result<String, AssistError> {
        if content.trim().is_empty() {
            return Err(AssistError::EmptyContent);
        }
        self.generator
            .summarize_content(content)
            .await
            .map_err(|source| generation_failed(AssistOperation::Summarize, source))
    }

    /// Replaces the report's content with a draft generated from its title.
    ///
    /// On success the history gains `Updated content` followed by
    /// `Generated draft content with AI`.
    pub async fn generate_draft(
        &self,
        store: &SharedReportStore,
        id: ReportId,
    ) -> Result<Report, AssistError> {
        let title = store
            .read(|store| store.get(id).map(|report| report.title.clone()))
            .ok_or(AssistError::ReportNotFound(id))?;
        let draft = self.draft_for_title(&title).await?;
        let report = apply(store, id, draft, GENERATED_DRAFT)?;
        info!("event=assist_apply module=service status=ok operation=draft report_id={id}");
        Ok(report)
    }

    /// Replaces the report's content with a summary of itself.
    ///
    /// On success the history gains `Updated content` followed by
    /// `Summarized content with AI`.
    pub async fn summarize(
        &self,
        store: &SharedReportStore,
        id: ReportId,
    ) -> Result<Report, AssistError> {
        let content = store
            .read(|store| store.get(id).map(|report| report.content.clone()))
            .ok_or(AssistError::ReportNotFound(id))?;
        let summary = self.summary_for_content(&content).await?;
        let report = apply(store, id, summary, SUMMARIZED_CONTENT)?;
        info!("event=assist_apply module=service status=ok operation=summarize report_id={id}");
        Ok(report)
    }
}

fn generation_failed(operation: AssistOperation, source: GenerationError) -> AssistError {
    warn!(
        "event=assist_call module=service status=error operation={} error={}",
        operation.as_str(),
        source
    );
    AssistError::Generation { operation, source }
}

fn apply(
    store: &SharedReportStore,
    id: ReportId,
    content: String,
    activity: &str,
) -> Result<Report, AssistError> {
    store.write(|store| -> Result<Report, AssistError> {
        store.update(id, ReportPatch::content(content))?;
        store.record_activity(id, activity)?;
        store.get(id).cloned().ok_or(AssistError::ReportNotFound(id))
    })
}
