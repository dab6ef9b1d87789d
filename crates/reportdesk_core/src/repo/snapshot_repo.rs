//! Snapshot repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist the full report collection plus current actor as one record
//!   keyed by a storage name.
//! - Restore that record at startup and reject unreadable payloads.
//!
//! # Invariants
//! - `save` replaces the whole record inside one IMMEDIATE transaction, so a
//!   concurrent reader sees either the previous or the new snapshot.
//! - `save` never lowers the stored revision written through this
//!   repository. Revisions are monotonic per store instance; two instances
//!   writing the same storage name are not reconciled.
//! - A decoded snapshot never contains duplicate report ids.

use crate::db::{open_db, DbError};
use crate::model::report::{Report, ReportId};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Instant;

/// Storage name used when none is configured.
pub const DEFAULT_STORAGE_NAME: &str = "report-storage";
/// Payload layout version written by this binary.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence-layer error.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Stored payload cannot be decoded into a valid collection.
    ///
    /// `revision` is the revision column of the unreadable row, so a
    /// recovering store can write past it.
    CorruptState {
        storage_name: String,
        revision: u64,
        details: String,
    },
    /// In-memory state could not be serialized.
    Encode(String),
    /// A snapshot with an equal or newer revision is already stored.
    StaleRevision { attempted: u64, stored: u64 },
    InvalidStorageName(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::CorruptState {
                storage_name,
                revision,
                details,
            } => write!(
                f,
                "snapshot `{storage_name}` at revision {revision} is unreadable: {details}"
            ),
            Self::Encode(details) => write!(f, "failed to encode snapshot: {details}"),
            Self::StaleRevision { attempted, stored } => write!(
                f,
                "refusing to overwrite snapshot revision {stored} with older revision {attempted}"
            ),
            Self::InvalidStorageName(name) => write!(f, "invalid storage name: `{name}`"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table: {table}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::from(value))
    }
}

/// Durable part of the store state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotState {
    pub reports: Vec<Report>,
    pub current_user: String,
}

/// One persisted snapshot and the mutation revision that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub revision: u64,
    pub state: SnapshotState,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    state: &'a SnapshotState,
    version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    state: SnapshotState,
    version: u32,
}

/// Persistence port used by the report store.
pub trait SnapshotRepository: Send {
    /// Loads the last saved snapshot, or `None` when nothing was saved yet.
    fn load(&self) -> RepoResult<Option<Snapshot>>;
    /// Replaces the stored snapshot with `state` at `revision`.
    fn save(&mut self, revision: u64, state: &SnapshotState) -> RepoResult<()>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository {
    conn: Connection,
    storage_name: String,
}

impl SqliteSnapshotRepository {
    /// Wraps a migrated connection.
    pub fn try_new(conn: Connection, storage_name: impl Into<String>) -> RepoResult<Self> {
        let storage_name = storage_name.into();
        let trimmed = storage_name.trim();
        if trimmed.is_empty() {
            return Err(RepoError::InvalidStorageName(storage_name));
        }
        if !table_exists(&conn, "snapshots")? {
            return Err(RepoError::MissingRequiredTable("snapshots"));
        }
        Ok(Self {
            storage_name: trimmed.to_string(),
            conn,
        })
    }

    /// Opens the database file at `path` and wraps it.
    pub fn open(path: impl AsRef<Path>, storage_name: impl Into<String>) -> RepoResult<Self> {
        let conn = open_db(path)?;
        Self::try_new(conn, storage_name)
    }

    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }
}

impl SnapshotRepository for SqliteSnapshotRepository {
    fn load(&self) -> RepoResult<Option<Snapshot>> {
        let row = self
            .conn
            .query_row(
                "SELECT revision, payload FROM snapshots WHERE name = ?1;",
                [self.storage_name.as_str()],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((raw_revision, payload)) = row else {
            info!("event=snapshot_load module=repo status=ok found=false");
            return Ok(None);
        };

        let revision = u64::try_from(raw_revision).map_err(|_| RepoError::CorruptState {
            storage_name: self.storage_name.clone(),
            revision: 0,
            details: format!("negative revision {raw_revision}"),
        })?;
        let state = decode_state(&self.storage_name, revision, &payload)?;
        info!(
            "event=snapshot_load module=repo status=ok found=true revision={} reports={} bytes={}",
            revision,
            state.reports.len(),
            payload.len()
        );
        Ok(Some(Snapshot { revision, state }))
    }

    fn save(&mut self, revision: u64, state: &SnapshotState) -> RepoResult<()> {
        let started_at = Instant::now();
        let payload = encode_state(state)?;
        let attempted = revision;
        let revision = i64::try_from(attempted)
            .map_err(|_| RepoError::Encode(format!("revision {attempted} out of range")))?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let stored: Option<i64> = tx
            .query_row(
                "SELECT revision FROM snapshots WHERE name = ?1;",
                [self.storage_name.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(stored) = stored {
            if stored >= revision {
                let stored = u64::try_from(stored).unwrap_or(0);
                warn!(
                    "event=snapshot_save module=repo status=error error_code=stale_revision attempted={} stored={}",
                    attempted, stored
                );
                return Err(RepoError::StaleRevision { attempted, stored });
            }
        }

        tx.execute(
            "INSERT INTO snapshots (name, revision, payload, saved_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
             ON CONFLICT(name) DO UPDATE SET
                revision = excluded.revision,
                payload = excluded.payload,
                saved_at = excluded.saved_at;",
            params![self.storage_name.as_str(), revision, payload.as_str()],
        )?;
        tx.commit()?;

        debug!(
            "event=snapshot_save module=repo status=ok revision={} reports={} bytes={} duration_ms={}",
            attempted,
            state.reports.len(),
            payload.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

/// Serializes a snapshot state into the persisted JSON envelope.
pub fn encode_state(state: &SnapshotState) -> RepoResult<String> {
    serde_json::to_string(&EnvelopeRef {
        state,
        version: SNAPSHOT_FORMAT_VERSION,
    })
    .map_err(|err| RepoError::Encode(err.to_string()))
}

/// Parses and validates a persisted JSON envelope.
///
/// Rejects unknown layout versions and duplicate report ids.
pub fn decode_state(storage_name: &str, revision: u64, payload: &str) -> RepoResult<SnapshotState> {
    let corrupt = |details: String| RepoError::CorruptState {
        storage_name: storage_name.to_string(),
        revision,
        details,
    };

    let envelope: Envelope = serde_json::from_str(payload).map_err(|err| corrupt(err.to_string()))?;
    if envelope.version != SNAPSHOT_FORMAT_VERSION {
        return Err(corrupt(format!(
            "unsupported payload version {}",
            envelope.version
        )));
    }
    if let Some(id) = first_duplicate_id(&envelope.state.reports) {
        return Err(corrupt(format!("duplicate report id {id}")));
    }
    Ok(envelope.state)
}

fn first_duplicate_id(reports: &[Report]) -> Option<ReportId> {
    let mut seen = HashSet::with_capacity(reports.len());
    reports
        .iter()
        .map(|report| report.id)
        .find(|id| !seen.insert(*id))
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::{decode_state, encode_state, RepoError, SnapshotState};
    use crate::model::report::Report;
    use uuid::Uuid;

    fn report(id: Uuid) -> Report {
        Report {
            id,
            title: "t".to_string(),
            content: String::new(),
            created_at: 1,
            updated_at: 1,
            activity_history: Vec::new(),
        }
    }

    #[test]
    fn encoded_payload_carries_layout_version() {
        let state = SnapshotState {
            reports: Vec::new(),
            current_user: "Anonymous User".to_string(),
        };
        let payload = encode_state(&state).unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["state"]["currentUser"], "Anonymous User");
        assert_eq!(decode_state("report-storage", 1, &payload).unwrap(), state);
    }

    #[test]
    fn decode_rejects_duplicate_ids() {
        let id = Uuid::new_v4();
        let state = SnapshotState {
            reports: vec![report(id), report(id)],
            current_user: "a".to_string(),
        };
        let payload = encode_state(&state).unwrap();
        let err = decode_state("report-storage", 7, &payload).unwrap_err();
        assert!(matches!(err, RepoError::CorruptState { revision: 7, .. }));
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let payload = r#"{"state":{"reports":[],"currentUser":"a"},"version":99}"#;
        let err = decode_state("report-storage", 0, payload).unwrap_err();
        assert!(err.to_string().contains("unsupported payload version 99"));
    }
}
