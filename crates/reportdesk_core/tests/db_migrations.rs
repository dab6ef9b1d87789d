use reportdesk_core::db::migrations::latest_version;
use reportdesk_core::db::{open_db, open_db_in_memory, DbError};
use reportdesk_core::{RepoError, ReportStore, SqliteSnapshotRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_creates_snapshot_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(
        snapshot_columns(&conn),
        vec!["name", "revision", "payload", "saved_at"]
    );
}

#[test]
fn reopening_a_database_keeps_schema_and_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reportdesk.sqlite3");

    {
        let repo = SqliteSnapshotRepository::open(&path, "report-storage").unwrap();
        let mut store = ReportStore::open(repo);
        store.create("survives reopen", "");
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM snapshots;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn storage_names_are_independent_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reportdesk.sqlite3");

    {
        let mut work = ReportStore::open(SqliteSnapshotRepository::open(&path, "work").unwrap());
        work.create("work report", "");
    }

    let personal = ReportStore::open(SqliteSnapshotRepository::open(&path, "personal").unwrap());
    assert!(personal.is_empty());
    let work = ReportStore::open(SqliteSnapshotRepository::open(&path, "work").unwrap());
    assert_eq!(work.len(), 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(matches!(
        SqliteSnapshotRepository::open(&path, "report-storage"),
        Err(RepoError::Db(DbError::UnsupportedSchemaVersion { .. }))
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn snapshot_columns(conn: &Connection) -> Vec<String> {
    let mut stmt = conn.prepare("PRAGMA table_info(snapshots);").unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        columns.push(row.get::<_, String>(1).unwrap());
    }
    columns
}
