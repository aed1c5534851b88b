use keepnote_core::db::migrations::{
    apply_migrations, latest_version, schema_state, steps, SchemaState,
};
use keepnote_core::db::{open_db, open_db_in_memory, DbError};
use keepnote_core::{RepoError, SqliteNoteRepository, SqliteUserRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["users", "notes", "labels", "note_labels", "checklist_items"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keepnote.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "notes");
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
}

#[test]
fn migration_steps_are_numbered_consecutively() {
    let all = steps();
    assert!(!all.is_empty());
    for (index, step) in all.iter().enumerate() {
        assert_eq!(step.version as usize, index + 1, "step {}", step.name);
    }
    assert_eq!(all.last().unwrap().version, latest_version());

    let mut names: Vec<_> = all.iter().map(|step| step.name).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), all.len());
}

#[test]
fn fresh_connection_runs_every_step_once() {
    let mut conn = Connection::open_in_memory().unwrap();
    assert_eq!(
        schema_state(&conn).unwrap(),
        SchemaState::Behind { version: 0 }
    );

    assert_eq!(apply_migrations(&mut conn).unwrap(), steps().len());
    assert_eq!(schema_state(&conn).unwrap(), SchemaState::Current);
    assert_eq!(apply_migrations(&mut conn).unwrap(), 0);
}

#[test]
fn interrupted_upgrade_resumes_at_missing_step() {
    let mut conn = Connection::open_in_memory().unwrap();
    apply_migrations(&mut conn).unwrap();
    conn.execute_batch(
        "DROP TABLE checklist_items;
         PRAGMA user_version = 2;",
    )
    .unwrap();

    assert_eq!(apply_migrations(&mut conn).unwrap(), 1);
    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "checklist_items");
}

#[test]
fn failed_step_is_rolled_back_and_named() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE notes (id TEXT PRIMARY KEY);")
        .unwrap();

    match apply_migrations(&mut conn).unwrap_err() {
        DbError::MigrationFailed { step, version, .. } => {
            assert_eq!(step, "users_notes");
            assert_eq!(version, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(schema_version(&conn), 0);
    let users_created: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(users_created, 0);
}

#[test]
fn repositories_refuse_unmigrated_connections() {
    let mut conn = Connection::open_in_memory().unwrap();

    match SqliteUserRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection was accepted"),
    }
    assert!(SqliteNoteRepository::try_new(&mut conn).is_err());
}

#[test]
fn storage_rejects_trashed_and_pinned_rows() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO users (id, username, token_hash, created_at)
         VALUES ('u1', 'alice', 'digest', 0);",
        [],
    )
    .unwrap();

    let inserted = conn.execute(
        "INSERT INTO notes (id, owner_user_id, is_pinned, is_trashed, created_at, updated_at)
         VALUES ('n1', 'u1', 1, 1, 0, 0);",
        [],
    );
    assert!(inserted.is_err());
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan = conn.execute(
        "INSERT INTO notes (id, owner_user_id, created_at, updated_at)
         VALUES ('n1', 'missing-user', 0, 0);",
        [],
    );
    assert!(orphan.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
