//! Report domain model.
//!
//! # Responsibility
//! - Define the records owned by the report store and persisted in snapshots.
//!
//! # Invariants
//! - Every report is identified by a stable `ReportId`.
//! - Deletion is a hard removal; no tombstones are kept.

pub mod report;
