//! Report and activity-entry records.
//!
//! # Responsibility
//! - Define the report document, its audit trail and partial-update shape.
//! - Fix the serialized field names used by persisted snapshots.
//!
//! # Invariants
//! - `id` and `created_at` never change after creation.
//! - `activity_history` is append-only and chronological.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a report.
pub type ReportId = Uuid;

/// One audit record of a change to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Short human-readable label, serialized as `type`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    /// Actor the change is attributed to.
    pub user: String,
}

/// A user-authored report document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    pub title: String,
    /// Opaque editor output; never inspected by the core.
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Bumped by every content mutation.
    pub updated_at: i64,
    pub activity_history: Vec<ActivityEntry>,
}

impl Report {
    /// Returns the most recent activity entry.
    pub fn last_activity(&self) -> Option<&ActivityEntry> {
        self.activity_history.last()
    }
}

/// Partial update for a report. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl ReportPatch {
    /// Patch that replaces only the title.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: None,
        }
    }

    /// Patch that replaces only the content.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: Some(content.into()),
        }
    }

    /// Patch that replaces both title and content.
    pub fn title_and_content(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
        }
    }

    /// Merges supplied fields into `report`.
    pub(crate) fn apply_to(self, report: &mut Report) {
        if let Some(title) = self.title {
            report.title = title;
        }
        if let Some(content) = self.content {
            report.content = content;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ActivityEntry, Report, ReportPatch};
    use uuid::Uuid;

    fn sample() -> Report {
        Report {
            id: Uuid::nil(),
            title: "Q1 Plan".to_string(),
            content: "body".to_string(),
            created_at: 10,
            updated_at: 20,
            activity_history: vec![ActivityEntry {
                kind: "Created report".to_string(),
                timestamp: 10,
                user: "Anonymous User".to_string(),
            }],
        }
    }

    #[test]
    fn serializes_with_persisted_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["createdAt"], 10);
        assert_eq!(value["updatedAt"], 20);
        assert_eq!(value["activityHistory"][0]["type"], "Created report");
        assert_eq!(value["activityHistory"][0]["user"], "Anonymous User");
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut report = sample();
        ReportPatch::title("Q2 Plan").apply_to(&mut report);
        assert_eq!(report.title, "Q2 Plan");
        assert_eq!(report.content, "body");

        ReportPatch::content("").apply_to(&mut report);
        assert_eq!(report.title, "Q2 Plan");
        assert_eq!(report.content, "");
    }
}
