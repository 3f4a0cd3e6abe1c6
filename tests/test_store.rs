//! Store tests: query execution, bulk-write helpers, and transaction
//! rollback.

use album_engine::{EngineError, Store};

fn scratch_store() -> Store {
    let store = Store::open_in_memory().unwrap();
    store
        .execute_batch("CREATE TABLE scratch (id BIGINT, val BIGINT, tag BIGINT)")
        .unwrap();
    store
}

// ---------------------------------------------------------------------------
// execute / execute_scalar / execute_into
// ---------------------------------------------------------------------------

#[test]
fn execute_returns_rows_as_maps() {
    let store = scratch_store();
    store
        .execute_batch("INSERT INTO scratch VALUES (1, 10, 0), (2, 20, 0)")
        .unwrap();

    let rows = store
        .execute("SELECT * FROM scratch ORDER BY id", &[])
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], 1);
    assert_eq!(rows[1]["val"], 20);
}

#[test]
fn execute_binds_parameters() {
    let store = scratch_store();
    store
        .execute_batch("INSERT INTO scratch VALUES (1, 10, 0), (2, 20, 0)")
        .unwrap();

    let rows = store
        .execute("SELECT * FROM scratch WHERE id = ?", &["2".to_string()])
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["val"], 20);
}

#[test]
fn execute_scalar_returns_none_on_empty() {
    let store = scratch_store();
    let value = store
        .execute_scalar("SELECT id FROM scratch WHERE id = 99", &[])
        .unwrap();
    assert!(value.is_none());
}

#[test]
fn count_defaults_to_zero() {
    let store = scratch_store();
    assert_eq!(store.count("SELECT COUNT(*) FROM scratch", &[]).unwrap(), 0);
}

#[test]
fn execute_into_deserializes_rows() {
    #[derive(serde::Deserialize)]
    struct Row {
        id: i64,
        val: i64,
    }

    let store = scratch_store();
    store
        .execute_batch("INSERT INTO scratch VALUES (7, 70, 0)")
        .unwrap();

    let rows: Vec<Row> = store
        .execute_into("SELECT id, val FROM scratch", &[])
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 7);
    assert_eq!(rows[0].val, 70);
}

// ---------------------------------------------------------------------------
// bulk helpers
// ---------------------------------------------------------------------------

#[test]
fn insert_rows_flushes_in_chunks() {
    let store = scratch_store();
    let rows: Vec<String> = (1..=5).map(|i| format!("({}, {}, 0)", i, i * 10)).collect();

    let written = store
        .insert_rows("scratch", "(id, val, tag)", &rows, 2)
        .unwrap();
    assert_eq!(written, 5);
    assert_eq!(store.count("SELECT COUNT(*) FROM scratch", &[]).unwrap(), 5);
}

#[test]
fn update_column_by_id_patches_every_row() {
    let store = scratch_store();
    let rows: Vec<String> = (1..=4).map(|i| format!("({}, 0, 0)", i)).collect();
    store.insert_rows("scratch", "(id, val, tag)", &rows, 10).unwrap();

    let patch: Vec<(i64, String)> = (1..=4).map(|i| (i, (i * 100).to_string())).collect();
    store
        .update_column_by_id("scratch", "val", "BIGINT", &patch, 3)
        .unwrap();

    let rows = store
        .execute("SELECT val FROM scratch ORDER BY id", &[])
        .unwrap();
    let vals: Vec<i64> = rows.iter().map(|r| r["val"].as_i64().unwrap()).collect();
    assert_eq!(vals, vec![100, 200, 300, 400]);
}

#[test]
fn update_two_columns_by_id_patches_both() {
    let store = scratch_store();
    store
        .execute_batch("INSERT INTO scratch VALUES (1, 0, 0), (2, 0, 0)")
        .unwrap();

    store
        .update_two_columns_by_id("scratch", "val", "tag", &[(1, 11, 21), (2, 12, 22)], 10)
        .unwrap();

    let rows = store
        .execute("SELECT val, tag FROM scratch ORDER BY id", &[])
        .unwrap();
    assert_eq!(rows[0]["val"], 11);
    assert_eq!(rows[0]["tag"], 21);
    assert_eq!(rows[1]["val"], 12);
    assert_eq!(rows[1]["tag"], 22);
}

#[test]
fn raw_exposes_the_underlying_connection() {
    let store = scratch_store();
    store
        .raw()
        .execute_batch("INSERT INTO scratch VALUES (5, 50, 0)")
        .unwrap();
    assert_eq!(store.count("SELECT COUNT(*) FROM scratch", &[]).unwrap(), 1);
}

// ---------------------------------------------------------------------------
// transactions
// ---------------------------------------------------------------------------

#[test]
fn failed_transaction_rolls_back() {
    let store = scratch_store();

    let result: album_engine::Result<()> = store.with_transaction(|| {
        store.execute_batch("INSERT INTO scratch VALUES (1, 1, 1)")?;
        Err(EngineError::InvalidArgument("boom".into()))
    });

    assert!(result.is_err());
    assert_eq!(store.count("SELECT COUNT(*) FROM scratch", &[]).unwrap(), 0);
}

#[test]
fn successful_transaction_commits() {
    let store = scratch_store();

    store
        .with_transaction(|| store.execute_batch("INSERT INTO scratch VALUES (1, 1, 1)"))
        .unwrap();

    assert_eq!(store.count("SELECT COUNT(*) FROM scratch", &[]).unwrap(), 1);
}
