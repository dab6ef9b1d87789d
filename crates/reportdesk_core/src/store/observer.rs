//! Store change notifications.

use crate::model::report::ReportId;
use std::collections::BTreeMap;

/// What a completed store operation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// State was replaced from storage by `reload`.
    Loaded,
    Created(ReportId),
    Updated(ReportId),
    Deleted(ReportId),
    Reordered { from: usize, to: usize },
    ActivityRecorded(ReportId),
    CurrentUserChanged,
}

/// Notification delivered to observers after each completed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    pub event: StoreEvent,
    /// Mutation revision the in-memory state is at.
    pub revision: u64,
    /// Whether the snapshot for `revision` reached durable storage.
    pub persisted: bool,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

pub type Observer = Box<dyn Fn(&StoreChange) + Send>;

/// Observers in subscription order.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    observers: BTreeMap<SubscriptionId, Observer>,
}

impl ObserverRegistry {
    pub(crate) fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.insert(id, observer);
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn notify(&self, change: &StoreChange) {
        for observer in self.observers.values() {
            observer(change);
        }
    }
}
