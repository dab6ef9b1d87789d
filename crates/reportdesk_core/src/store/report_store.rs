//! Authoritative in-memory report collection.
//!
//! # Responsibility
//! - Own the ordered report collection and the current actor.
//! - Apply create/update/delete/reorder/record-activity mutations.
//! - Flush a full snapshot after every mutation and notify observers.
//!
//! # Invariants
//! - Report ids in the collection are pairwise distinct.
//! - Every content mutation bumps `updated_at` and appends exactly one
//!   activity entry; reordering touches neither.
//! - Each mutation gets the next revision; snapshots are saved in revision
//!   order before the call returns.
//! - Persistence failures never roll back in-memory state.
//!
//! # Missing ids
//! `update`, `record_activity` and `reorder_by_id` return
//! [`StoreError::NotFound`] and change nothing. `delete` returns `false`.

use crate::identity::{new_report_id, Clock, SystemClock};
use crate::model::report::{Report, ReportId, ReportPatch};
use crate::repo::snapshot_repo::{RepoError, Snapshot, SnapshotRepository, SnapshotState};
use crate::store::activity::{self, CREATED_REPORT};
use crate::store::observer::{ObserverRegistry, StoreChange, StoreEvent, SubscriptionId};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Actor used until `set_current_user` is called.
pub const DEFAULT_USER: &str = "Anonymous User";

/// Store operation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    NotFound(ReportId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "report not found: {id}"),
        }
    }
}

impl Error for StoreError {}

/// A save that failed after the in-memory mutation was applied.
#[derive(Debug)]
pub struct PersistenceWarning {
    /// Revision whose snapshot was not written.
    pub revision: u64,
    pub error: RepoError,
}

impl Display for PersistenceWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "changes at revision {} are not saved: {}",
            self.revision, self.error
        )
    }
}

impl Error for PersistenceWarning {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

/// Report store backed by a snapshot repository.
pub struct ReportStore {
    state: SnapshotState,
    revision: u64,
    repo: Box<dyn SnapshotRepository>,
    clock: Arc<dyn Clock>,
    observers: ObserverRegistry,
    load_warning: Option<RepoError>,
    persistence_warning: Option<PersistenceWarning>,
}

impl ReportStore {
    /// Loads the last snapshot from `repo` using the system clock.
    ///
    /// Never fails: an unreadable snapshot leaves the store empty and is
    /// reported through [`ReportStore::load_warning`].
    pub fn open(repo: impl SnapshotRepository + 'static) -> Self {
        Self::open_with_clock(repo, Arc::new(SystemClock))
    }

    /// Same as [`ReportStore::open`] with an explicit clock.
    pub fn open_with_clock(repo: impl SnapshotRepository + 'static, clock: Arc<dyn Clock>) -> Self {
        let mut store = Self {
            state: empty_state(),
            revision: 0,
            repo: Box::new(repo),
            clock,
            observers: ObserverRegistry::default(),
            load_warning: None,
            persistence_warning: None,
        };
        store.load_snapshot();
        store
    }

    /// Replaces in-memory state with the stored snapshot.
    ///
    /// Used to pick up writes made by another instance. When the snapshot
    /// cannot be read the in-memory collection is kept, the error is exposed
    /// through [`ReportStore::load_warning`] and observers see
    /// `persisted: false`.
    pub fn reload(&mut self) {
        let applied = self.reload_snapshot();
        self.observers.notify(&StoreChange {
            event: StoreEvent::Loaded,
            revision: self.revision,
            persisted: applied,
        });
    }

    /// Creates a report at the end of the collection and returns its id.
    pub fn create(&mut self, title: impl Into<String>, content: impl Into<String>) -> ReportId {
        let now = self.clock.now_ms();
        let mut id = new_report_id();
        while self.index_of(id).is_some() {
            id = new_report_id();
        }

        let mut report = Report {
            id,
            title: title.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
            activity_history: Vec::with_capacity(1),
        };
        activity::record(&mut report, CREATED_REPORT, &self.state.current_user, now);
        self.state.reports.push(report);

        debug!(
            "event=report_create module=store status=ok report_id={} reports={}",
            id,
            self.state.reports.len()
        );
        self.commit(StoreEvent::Created(id));
        id
    }

    /// Merges the supplied fields of `patch` into the report.
    ///
    /// Appends one entry labelled by [`activity::label_for_patch`].
    pub fn update(&mut self, id: ReportId, patch: ReportPatch) -> Result<(), StoreError> {
        let index = self.require_index(id, "report_update")?;
        let now = self.clock.now_ms();
        let label = activity::label_for_patch(&patch);

        let report = &mut self.state.reports[index];
        patch.apply_to(report);
        activity::record(report, label, &self.state.current_user, now);

        debug!("event=report_update module=store status=ok report_id={id} activity={label}");
        self.commit(StoreEvent::Updated(id));
        Ok(())
    }

    /// Removes the report. Returns `false` when it was not present.
    pub fn delete(&mut self, id: ReportId) -> bool {
        let Some(index) = self.index_of(id) else {
            debug!("event=report_delete module=store status=noop report_id={id}");
            return false;
        };

        self.state.reports.remove(index);
        debug!(
            "event=report_delete module=store status=ok report_id={} reports={}",
            id,
            self.state.reports.len()
        );
        self.commit(StoreEvent::Deleted(id));
        true
    }

    /// Moves the report at `from` to position `to`, shifting the ones between.
    ///
    /// Leaves `updated_at` and histories untouched. `from == to` changes
    /// nothing and is not persisted.
    ///
    /// # Panics
    /// Panics when either index is `>= self.len()`.
    pub fn reorder(&mut self, from: usize, to: usize) {
        let len = self.state.reports.len();
        assert!(
            from < len && to < len,
            "reorder indices out of range: from={from} to={to} len={len}"
        );
        if from == to {
            return;
        }

        let moved = self.state.reports.remove(from);
        self.state.reports.insert(to, moved);
        debug!("event=report_reorder module=store status=ok from={from} to={to}");
        self.commit(StoreEvent::Reordered { from, to });
    }

    /// Moves report `active` to the position currently held by `over`.
    ///
    /// Drag-and-drop form of [`ReportStore::reorder`].
    pub fn reorder_by_id(&mut self, active: ReportId, over: ReportId) -> Result<(), StoreError> {
        let from = self.require_index(active, "report_reorder")?;
        let to = self.require_index(over, "report_reorder")?;
        self.reorder(from, to);
        Ok(())
    }

    /// Appends a free-text activity entry and bumps `updated_at`.
    pub fn record_activity(
        &mut self,
        id: ReportId,
        kind: impl Into<String>,
    ) -> Result<(), StoreError> {
        let index = self.require_index(id, "activity_record")?;
        let now = self.clock.now_ms();

        let report = &mut self.state.reports[index];
        activity::record(report, kind, &self.state.current_user, now);

        debug!("event=activity_record module=store status=ok report_id={id}");
        self.commit(StoreEvent::ActivityRecorded(id));
        Ok(())
    }

    /// Sets the actor for subsequent activity entries.
    ///
    /// Surrounding whitespace is dropped; a blank name restores
    /// [`DEFAULT_USER`].
    pub fn set_current_user(&mut self, name: impl AsRef<str>) {
        let trimmed = name.as_ref().trim();
        self.state.current_user = if trimmed.is_empty() {
            DEFAULT_USER.to_string()
        } else {
            trimmed.to_string()
        };
        debug!("event=user_set module=store status=ok");
        self.commit(StoreEvent::CurrentUserChanged);
    }

    pub fn get(&self, id: ReportId) -> Option<&Report> {
        self.state.reports.iter().find(|report| report.id == id)
    }

    /// All reports in display order.
    pub fn list(&self) -> &[Report] {
        &self.state.reports
    }

    /// Reports whose title contains `term`, case-insensitively, in display order.
    pub fn search_by_title(&self, term: &str) -> Vec<&Report> {
        let needle = term.trim().to_lowercase();
        self.state
            .reports
            .iter()
            .filter(|report| needle.is_empty() || report.title.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn current_user(&self) -> &str {
        &self.state.current_user
    }

    pub fn len(&self) -> usize {
        self.state.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.reports.is_empty()
    }

    /// Revision of the current in-memory state.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Error from the most recent load or reload, if it failed.
    pub fn load_warning(&self) -> Option<&RepoError> {
        self.load_warning.as_ref()
    }

    /// Most recent failed save; cleared by the next successful one.
    pub fn last_persistence_warning(&self) -> Option<&PersistenceWarning> {
        self.persistence_warning.as_ref()
    }

    pub fn take_persistence_warning(&mut self) -> Option<PersistenceWarning> {
        self.persistence_warning.take()
    }

    /// Registers `observer` for every completed mutation.
    pub fn subscribe(
        &mut self,
        observer: impl Fn(&StoreChange) + Send + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(Box::new(observer))
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Startup load: any failure leaves the store empty.
    fn load_snapshot(&mut self) {
        let started_at = Instant::now();
        match self.repo.load() {
            Ok(snapshot) => self.replace_state(snapshot),
            Err(err) => {
                // A corrupt row is overwritten by the next save; any other
                // failure keeps revision 0 so stale saves cannot clobber it.
                let revision = corrupt_revision(&err).unwrap_or(0);
                warn!(
                    "event=store_load module=store status=warn error_code={} revision={} error={}",
                    load_error_code(&err),
                    revision,
                    err
                );
                self.state = empty_state();
                self.revision = revision;
                self.load_warning = Some(err);
            }
        }
        info!(
            "event=store_load module=store status=ok reports={} revision={} duration_ms={}",
            self.state.reports.len(),
            self.revision,
            started_at.elapsed().as_millis()
        );
    }

    /// Reload: a failure keeps the last-known-good in-memory state.
    ///
    /// Returns whether the stored snapshot was applied.
    fn reload_snapshot(&mut self) -> bool {
        match self.repo.load() {
            Ok(snapshot) => {
                self.replace_state(snapshot);
                debug!(
                    "event=store_reload module=store status=ok reports={} revision={}",
                    self.state.reports.len(),
                    self.revision
                );
                true
            }
            Err(err) => {
                if let Some(revision) = corrupt_revision(&err) {
                    self.revision = self.revision.max(revision);
                }
                warn!(
                    "event=store_reload module=store status=warn error_code={} reports={} revision={} error={}",
                    load_error_code(&err),
                    self.state.reports.len(),
                    self.revision,
                    err
                );
                self.load_warning = Some(err);
                false
            }
        }
    }

    fn replace_state(&mut self, snapshot: Option<Snapshot>) {
        match snapshot {
            Some(snapshot) => {
                self.state = snapshot.state;
                self.revision = snapshot.revision;
            }
            None => {
                self.state = empty_state();
                self.revision = 0;
            }
        }
        self.load_warning = None;
    }

    fn commit(&mut self, event: StoreEvent) {
        self.revision += 1;
        let persisted = match self.repo.save(self.revision, &self.state) {
            Ok(()) => {
                self.persistence_warning = None;
                true
            }
            Err(error) => {
                warn!(
                    "event=snapshot_flush module=store status=warn revision={} error={}",
                    self.revision, error
                );
                self.persistence_warning = Some(PersistenceWarning {
                    revision: self.revision,
                    error,
                });
                false
            }
        };

        self.observers.notify(&StoreChange {
            event,
            revision: self.revision,
            persisted,
        });
    }

    fn index_of(&self, id: ReportId) -> Option<usize> {
        self.state.reports.iter().position(|report| report.id == id)
    }

    fn require_index(&self, id: ReportId, event: &str) -> Result<usize, StoreError> {
        self.index_of(id).ok_or_else(|| {
            debug!("event={event} module=store status=not_found report_id={id}");
            StoreError::NotFound(id)
        })
    }
}

fn corrupt_revision(err: &RepoError) -> Option<u64> {
    match err {
        RepoError::CorruptState { revision, .. } => Some(*revision),
        _ => None,
    }
}

fn load_error_code(err: &RepoError) -> &'static str {
    match err {
        RepoError::CorruptState { .. } => "corrupt_snapshot",
        RepoError::Db(db) if db.is_busy() => "db_busy",
        _ => "load_failed",
    }
}

fn empty_state() -> SnapshotState {
    SnapshotState {
        reports: Vec::new(),
        current_user: DEFAULT_USER.to_string(),
    }
}
