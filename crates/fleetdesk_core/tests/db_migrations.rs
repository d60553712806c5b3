use fleetdesk_core::db::migrations::latest_version;
use fleetdesk_core::db::{open_db, open_db_in_memory, DbError};
use fleetdesk_core::{RepoError, SqliteVehicleRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "vehicles");
    assert_table_exists(&conn, "reminders");
    assert_table_exists(&conn, "notifications");
}

#[test]
fn reopening_file_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleetdesk.db");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    assert_table_exists(&second, "notifications");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
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
fn repositories_refuse_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteVehicleRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::Db(DbError::SchemaNotReady { db_version: 0, .. })
    ));
}

#[test]
fn notification_identity_key_is_unique() {
    let conn = open_db_in_memory().unwrap();
    let insert = "INSERT INTO notifications (
            id, identity_key, vehicle_id, reminder_kind, reminder_name, due_date,
            days_until_due, status, priority, message, created_at
        ) VALUES (?1, 'ABC-123|insurance|2025-06-05', 'ABC-123', 'insurance',
            'Insurance Renewal', '2025-06-05', 4, 'expiring_soon', 'high', 'm', 0);";

    conn.execute(insert, ["a"]).unwrap();
    assert!(conn.execute(insert, ["b"]).is_err());
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
