//! Persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the snapshot persistence port used by the report store.
//! - Keep SQL and payload encoding details out of the store.
//!
//! # Invariants
//! - Repositories return semantic errors (`CorruptState`, `StaleRevision`)
//!   in addition to database transport errors.

pub mod snapshot_repo;
