//! Activity recorder.
//!
//! # Responsibility
//! - Name the activity labels written into report histories.
//! - Derive the label for a partial update from which fields it supplies.
//!
//! # Invariants
//! - Derivation looks at field presence only, never at field values.
//! - Every recorded entry carries the acting user and the mutation time.

use crate::model::report::{ActivityEntry, Report, ReportPatch};

pub const CREATED_REPORT: &str = "Created report";
pub const UPDATED_REPORT: &str = "Updated report";
pub const UPDATED_TITLE: &str = "Updated title";
pub const UPDATED_CONTENT: &str = "Updated content";
pub const GENERATED_DRAFT: &str = "Generated draft content with AI";
pub const SUMMARIZED_CONTENT: &str = "Summarized content with AI";

/// Returns the activity label for applying `patch`.
///
/// | title | content | label |
/// |---|---|---|
/// | yes | no | `Updated title` |
/// | no | yes | `Updated content` |
/// | otherwise | | `Updated report` |
pub fn label_for_patch(patch: &ReportPatch) -> &'static str {
    match (patch.title.is_some(), patch.content.is_some()) {
        (true, false) => UPDATED_TITLE,
        (false, true) => UPDATED_CONTENT,
        _ => UPDATED_REPORT,
    }
}

/// Appends one entry to `report` and bumps `updated_at`.
pub(crate) fn record(report: &mut Report, kind: impl Into<String>, user: &str, now_ms: i64) {
    report.updated_at = now_ms;
    report.activity_history.push(ActivityEntry {
        kind: kind.into(),
        timestamp: now_ms,
        user: user.to_string(),
    });
}
