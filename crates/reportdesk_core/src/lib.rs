//! Core domain logic for ReportDesk.
//! This crate owns the report collection, its audit trail and persistence.

pub mod config;
pub mod db;
pub mod generation;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, GenerationConfig, ReportDeskConfig};
pub use generation::{GenerationError, GenerationResult, OpenAiTextGenerator, TextGenerator};
pub use identity::{Clock, ManualClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::report::{ActivityEntry, Report, ReportId, ReportPatch};
pub use repo::snapshot_repo::{
    RepoError, RepoResult, Snapshot, SnapshotRepository, SnapshotState, SqliteSnapshotRepository,
    DEFAULT_STORAGE_NAME,
};
pub use service::assist_service::{AssistError, AssistOperation, AssistService};
pub use store::observer::{StoreChange, StoreEvent, SubscriptionId};
pub use store::report_store::{PersistenceWarning, ReportStore, StoreError, DEFAULT_USER};
pub use store::shared::SharedReportStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
