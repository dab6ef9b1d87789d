use reportdesk_core::db::open_db_in_memory;
use reportdesk_core::{
    ManualClock, ReportId, ReportPatch, ReportStore, SqliteSnapshotRepository, StoreChange,
    StoreError, StoreEvent, DEFAULT_USER,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

fn open_store() -> (ReportStore, Arc<ManualClock>) {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSnapshotRepository::try_new(conn, "report-storage").unwrap();
    let clock = Arc::new(ManualClock::new(1_000));
    let store = ReportStore::open_with_clock(repo, clock.clone());
    (store, clock)
}

fn ids(store: &ReportStore) -> Vec<ReportId> {
    store.list().iter().map(|report| report.id).collect()
}

#[test]
fn create_sets_equal_timestamps_and_single_created_entry() {
    let (mut store, _clock) = open_store();
    let id = store.create("Q1 Plan", "");

    let report = store.get(id).unwrap();
    assert_eq!(report.title, "Q1 Plan");
    assert_eq!(report.content, "");
    assert_eq!(report.created_at, 1_000);
    assert_eq!(report.created_at, report.updated_at);
    assert_eq!(report.activity_history.len(), 1);
    assert_eq!(report.activity_history[0].kind, "Created report");
    assert_eq!(report.activity_history[0].user, DEFAULT_USER);
    assert_eq!(report.activity_history[0].timestamp, 1_000);
}

#[test]
fn create_appends_to_end_of_collection() {
    let (mut store, _clock) = open_store();
    let first = store.create("a", "");
    let second = store.create("b", "");
    let third = store.create("c", "");
    assert_eq!(ids(&store), vec![first, second, third]);
}

#[test]
fn title_update_changes_only_title_and_updated_at() {
    let (mut store, clock) = open_store();
    let id = store.create("Q1 Plan", "body");
    let before = store.get(id).unwrap().clone();

    clock.advance(500);
    store.update(id, ReportPatch::title("Q1 Plan v2")).unwrap();

    let after = store.get(id).unwrap();
    assert_eq!(after.title, "Q1 Plan v2");
    assert_eq!(after.content, "body");
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.updated_at, 1_500);
    assert_eq!(after.activity_history.len(), 2);
    assert_eq!(after.activity_history[0], before.activity_history[0]);
    assert_eq!(after.activity_history[1].kind, "Updated title");
    assert_eq!(after.activity_history[1].timestamp, 1_500);
}

#[test]
fn update_labels_follow_supplied_fields() {
    let (mut store, _clock) = open_store();
    let id = store.create("t", "c");

    store
        .update(id, ReportPatch::title_and_content("X", "Y"))
        .unwrap();
    store.update(id, ReportPatch::content("Z")).unwrap();
    store.update(id, ReportPatch::default()).unwrap();

    let report = store.get(id).unwrap();
    let labels: Vec<&str> = report
        .activity_history
        .iter()
        .map(|entry| entry.kind.as_str())
        .collect();
    assert_eq!(
        labels,
        vec![
            "Created report",
            "Updated report",
            "Updated content",
            "Updated report"
        ]
    );
    assert_eq!(report.title, "X");
    assert_eq!(report.content, "Z");
}

#[test]
fn update_missing_report_is_not_found_and_changes_nothing() {
    let (mut store, _clock) = open_store();
    store.create("kept", "");
    let revision = store.revision();
    let missing = Uuid::new_v4();

    let err = store.update(missing, ReportPatch::title("x")).unwrap_err();
    assert_eq!(err, StoreError::NotFound(missing));
    assert_eq!(store.revision(), revision);
    assert_eq!(store.len(), 1);
    assert_eq!(store.list()[0].activity_history.len(), 1);
}

#[test]
fn delete_removes_exactly_one_or_nothing() {
    let (mut store, _clock) = open_store();
    let first = store.create("a", "");
    let second = store.create("b", "");

    assert!(store.delete(first));
    assert_eq!(ids(&store), vec![second]);

    let revision = store.revision();
    assert!(!store.delete(first));
    assert!(!store.delete(Uuid::new_v4()));
    assert_eq!(store.len(), 1);
    assert_eq!(store.revision(), revision);
}

#[test]
fn ids_stay_unique_across_create_and_delete() {
    let (mut store, _clock) = open_store();
    let mut created = Vec::new();
    for idx in 0..50 {
        created.push(store.create(format!("report {idx}"), ""));
        if idx % 3 == 0 {
            store.delete(created[idx / 2]);
        }
    }

    let unique: HashSet<ReportId> = ids(&store).into_iter().collect();
    assert_eq!(unique.len(), store.len());
}

#[test]
fn reorder_moves_item_and_shifts_the_rest() {
    let (mut store, clock) = open_store();
    let a = store.create("a", "");
    let b = store.create("b", "");
    let c = store.create("c", "");
    let snapshot_before = store.list().to_vec();

    clock.advance(10_000);
    store.reorder(2, 0);
    assert_eq!(ids(&store), vec![c, a, b]);

    for report in store.list() {
        let original = snapshot_before
            .iter()
            .find(|candidate| candidate.id == report.id)
            .unwrap();
        assert_eq!(report, original);
    }

    store.reorder(0, 2);
    assert_eq!(ids(&store), vec![a, b, c]);
}

#[test]
fn adjacent_swap_is_undone_by_reverse_reorder() {
    let (mut store, _clock) = open_store();
    for title in ["a", "b", "c", "d"] {
        store.create(title, "");
    }
    let original = ids(&store);

    store.reorder(1, 2);
    assert_ne!(ids(&store), original);
    store.reorder(2, 1);
    assert_eq!(ids(&store), original);
}

#[test]
fn reorder_to_same_index_is_a_no_op() {
    let (mut store, _clock) = open_store();
    store.create("a", "");
    store.create("b", "");
    let revision = store.revision();

    store.reorder(1, 1);
    assert_eq!(store.revision(), revision);
}

#[test]
#[should_panic(expected = "reorder indices out of range")]
fn reorder_out_of_range_panics() {
    let (mut store, _clock) = open_store();
    store.create("a", "");
    store.reorder(0, 1);
}

#[test]
fn reorder_by_id_moves_active_onto_over_position() {
    let (mut store, _clock) = open_store();
    let a = store.create("a", "");
    let b = store.create("b", "");
    let c = store.create("c", "");

    store.reorder_by_id(a, c).unwrap();
    assert_eq!(ids(&store), vec![b, c, a]);

    let missing = Uuid::new_v4();
    let err = store.reorder_by_id(missing, a).unwrap_err();
    assert_eq!(err, StoreError::NotFound(missing));
    assert_eq!(ids(&store), vec![b, c, a]);
}

#[test]
fn record_activity_appends_literal_label_without_touching_fields() {
    let (mut store, clock) = open_store();
    let id = store.create("Q1 Plan", "Draft text");

    clock.advance(42);
    store
        .record_activity(id, "Generated draft content with AI")
        .unwrap();

    let report = store.get(id).unwrap();
    assert_eq!(report.title, "Q1 Plan");
    assert_eq!(report.content, "Draft text");
    assert_eq!(report.updated_at, 1_042);
    assert_eq!(report.activity_history.len(), 2);
    assert_eq!(
        report.last_activity().unwrap().kind,
        "Generated draft content with AI"
    );

    let missing = Uuid::new_v4();
    assert_eq!(
        store.record_activity(missing, "x").unwrap_err(),
        StoreError::NotFound(missing)
    );
}

#[test]
fn current_user_is_attributed_to_later_entries() {
    let (mut store, _clock) = open_store();
    let id = store.create("a", "");

    store.set_current_user("  ana  ");
    assert_eq!(store.current_user(), "ana");
    store.update(id, ReportPatch::title("b")).unwrap();

    store.set_current_user("   ");
    assert_eq!(store.current_user(), DEFAULT_USER);
    store.record_activity(id, "Reviewed").unwrap();

    let users: Vec<&str> = store
        .get(id)
        .unwrap()
        .activity_history
        .iter()
        .map(|entry| entry.user.as_str())
        .collect();
    assert_eq!(users, vec![DEFAULT_USER, "ana", DEFAULT_USER]);
}

#[test]
fn get_and_list_do_not_mutate() {
    let (mut store, clock) = open_store();
    let id = store.create("a", "");
    let revision = store.revision();

    clock.advance(1_000);
    let fetched = store.get(id).unwrap().clone();
    let _ = store.list();
    let _ = store.search_by_title("a");

    assert_eq!(store.get(id).unwrap(), &fetched);
    assert_eq!(fetched.updated_at, 1_000);
    assert_eq!(store.revision(), revision);
}

#[test]
fn search_by_title_is_case_insensitive_and_keeps_order() {
    let (mut store, _clock) = open_store();
    let q1 = store.create("Q1 Plan", "");
    store.create("Budget", "");
    let q2 = store.create("q2 plan", "");

    let hits: Vec<ReportId> = store
        .search_by_title("PLAN")
        .into_iter()
        .map(|report| report.id)
        .collect();
    assert_eq!(hits, vec![q1, q2]);
    assert_eq!(store.search_by_title("").len(), 3);
    assert!(store.search_by_title("missing").is_empty());
}

#[test]
fn observers_see_each_completed_mutation() {
    let (mut store, _clock) = open_store();
    let seen: Arc<Mutex<Vec<StoreChange>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let subscription = store.subscribe(move |change| sink.lock().unwrap().push(*change));

    let a = store.create("a", "");
    let b = store.create("b", "");
    store.update(a, ReportPatch::content("x")).unwrap();
    store.reorder(1, 0);
    store.record_activity(b, "Reviewed").unwrap();
    store.set_current_user("ana");
    store.delete(a);
    let _ = store.update(Uuid::new_v4(), ReportPatch::title("ignored"));

    let events: Vec<StoreEvent> = seen.lock().unwrap().iter().map(|c| c.event).collect();
    assert_eq!(
        events,
        vec![
            StoreEvent::Created(a),
            StoreEvent::Created(b),
            StoreEvent::Updated(a),
            StoreEvent::Reordered { from: 1, to: 0 },
            StoreEvent::ActivityRecorded(b),
            StoreEvent::CurrentUserChanged,
            StoreEvent::Deleted(a),
        ]
    );
    let revisions: Vec<u64> = seen.lock().unwrap().iter().map(|c| c.revision).collect();
    assert_eq!(revisions, (1..=7).collect::<Vec<u64>>());
    assert!(seen.lock().unwrap().iter().all(|change| change.persisted));

    assert!(store.unsubscribe(subscription));
    assert!(!store.unsubscribe(subscription));
    store.create("c", "");
    assert_eq!(seen.lock().unwrap().len(), 7);
    assert_eq!(store.observer_count(), 0);
}
