//! Report store and its activity recorder.
//!
//! # Responsibility
//! - Be the only mutator of the report collection.
//! - Derive activity entries, drive persistence and notify observers.
//!
//! # See also
//! - `repo::snapshot_repo` for the durable snapshot layout.

pub mod activity;
pub mod observer;
pub mod report_store;
pub mod shared;
