//! DuckDB store wrapper: schema bootstrap, query execution, transactions,
//! and the chunked bulk-write helpers the edition pipeline is built on.
//!
//! One `Store` wraps one DuckDB connection. Every edition build runs inside
//! a single transaction; bulk inserts and updates are flushed in chunks of
//! the layout's `batch_size` so memory stays bounded on large circulations.

use crate::cache::StatsCache;
use crate::error::Result;
use duckdb::{types::ValueRef, Connection as DuckDbConnection};
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Tables and id sequences of the engine, children last.
///
/// Deletion cascades run child-first; the validator enforces the uniqueness
/// invariants declaratively-minded stores would put in DDL, because the
/// shuffler has to permute ordinal columns in place.
const SCHEMA: &str = r#"
CREATE SEQUENCE IF NOT EXISTS promotion_ids;
CREATE SEQUENCE IF NOT EXISTS template_ids;
CREATE SEQUENCE IF NOT EXISTS coordinate_ids;
CREATE SEQUENCE IF NOT EXISTS standard_prize_ids;
CREATE SEQUENCE IF NOT EXISTS surprise_prize_ids;
CREATE SEQUENCE IF NOT EXISTS edition_ids;
CREATE SEQUENCE IF NOT EXISTS box_ids;
CREATE SEQUENCE IF NOT EXISTS pack_ids;
CREATE SEQUENCE IF NOT EXISTS sticker_ids;
CREATE SEQUENCE IF NOT EXISTS sticker_prize_ids;

CREATE TABLE IF NOT EXISTS promotions (
    id BIGINT PRIMARY KEY DEFAULT nextval('promotion_ids'),
    name VARCHAR NOT NULL,
    start_date DATE NOT NULL DEFAULT current_date,
    end_date DATE NOT NULL,
    pack_cost DECIMAL(6, 2) NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS templates (
    id BIGINT PRIMARY KEY DEFAULT nextval('template_ids'),
    name VARCHAR NOT NULL,
    layout VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS coordinates (
    id BIGINT PRIMARY KEY DEFAULT nextval('coordinate_ids'),
    template_id BIGINT NOT NULL,
    page BIGINT NOT NULL,
    slot_number BIGINT NOT NULL,
    ordinal BIGINT NOT NULL DEFAULT 0,
    absolute_number BIGINT NOT NULL DEFAULT 0,
    rarity_factor DECIMAL(9, 3) NOT NULL DEFAULT 0,
    image_ref VARCHAR
);

CREATE TABLE IF NOT EXISTS standard_prizes (
    id BIGINT PRIMARY KEY DEFAULT nextval('standard_prize_ids'),
    template_id BIGINT NOT NULL,
    page BIGINT NOT NULL,
    description VARCHAR NOT NULL DEFAULT 'undefined'
);

CREATE TABLE IF NOT EXISTS surprise_prizes (
    id BIGINT PRIMARY KEY DEFAULT nextval('surprise_prize_ids'),
    template_id BIGINT NOT NULL,
    number BIGINT NOT NULL,
    description VARCHAR NOT NULL DEFAULT 'undefined'
);

CREATE TABLE IF NOT EXISTS editions (
    id BIGINT PRIMARY KEY DEFAULT nextval('edition_ids'),
    template_id BIGINT NOT NULL,
    promotion_id BIGINT NOT NULL,
    circulation UBIGINT NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT current_timestamp
);

CREATE TABLE IF NOT EXISTS boxes (
    id BIGINT PRIMARY KEY DEFAULT nextval('box_ids'),
    edition_id BIGINT NOT NULL,
    ordinal BIGINT NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS packs (
    id BIGINT PRIMARY KEY DEFAULT nextval('pack_ids'),
    edition_id BIGINT NOT NULL,
    box_id BIGINT,
    ordinal BIGINT NOT NULL DEFAULT 0,
    is_open BOOLEAN NOT NULL DEFAULT FALSE,
    holder_id BIGINT
);

CREATE TABLE IF NOT EXISTS stickers (
    id BIGINT PRIMARY KEY DEFAULT nextval('sticker_ids'),
    edition_id BIGINT NOT NULL,
    pack_id BIGINT,
    coordinate_id BIGINT NOT NULL,
    ordinal BIGINT NOT NULL DEFAULT 0,
    holder_id BIGINT,
    on_the_board BOOLEAN NOT NULL DEFAULT FALSE,
    is_repeated BOOLEAN NOT NULL DEFAULT FALSE,
    is_rescued BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS sticker_prizes (
    id BIGINT PRIMARY KEY DEFAULT nextval('sticker_prize_ids'),
    sticker_id BIGINT NOT NULL,
    prize_id BIGINT NOT NULL
);
"#;

/// Wraps a DuckDB connection holding the engine schema.
///
/// Also owns the TTL'd distribution-statistics cache, which is shared by
/// every query interface borrowing this store.
pub struct Store {
    conn: DuckDbConnection,
    /// Cached aggregate statistics, keyed by edition id.
    pub stats: RefCell<StatsCache>,
}

impl Store {
    /// Open an in-memory store with the schema created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Self::bootstrap(conn)
    }

    /// Open (or create) a file-backed store, creating parent directories
    /// and the schema as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = DuckDbConnection::open(path.as_ref())?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: DuckDbConnection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            stats: RefCell::new(StatsCache::default()),
        })
    }

    /// Run `f` inside one transaction; roll everything back on error.
    ///
    /// This is the durability boundary of an edition build: a failed build
    /// leaves no rows behind.
    pub fn with_transaction<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        match f() {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();

        let mut rows_result = stmt.query(param_values.as_slice())?;

        // Get column metadata AFTER query execution (calling before panics in duckdb-rs)
        let column_names: Vec<String> = rows_result
            .as_ref()
            .unwrap()
            .column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        let column_count = rows_result.as_ref().unwrap().column_count();

        let mut out: Vec<HashMap<String, serde_json::Value>> = Vec::new();

        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::new();
            for i in 0..column_count {
                let col_name = &column_names[i];
                let value = convert_value_ref(row.get_ref(i)?);
                map.insert(col_name.clone(), value);
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(
                row.into_iter()
                    .collect::<serde_json::Map<String, serde_json::Value>>(),
            );
            let item: T = serde_json::from_value(value)?;
            results.push(item);
        }
        Ok(results)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Option<serde_json::Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        if let Some(row) = rows.next()? {
            let value = convert_value_ref(row.get_ref(0)?);
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// Execute SQL and return the first column of the first row as `i64`,
    /// defaulting to 0. Intended for COUNT-style queries.
    pub fn count(&self, sql: &str, params: &[String]) -> Result<i64> {
        Ok(self
            .execute_scalar(sql, params)?
            .and_then(|v| v.as_i64())
            .unwrap_or(0))
    }

    /// Run one or more semicolon-separated statements without results.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Bulk insert preformatted value tuples, flushed in chunks.
    ///
    /// `columns` is the parenthesized column list, each row a `(..)` tuple
    /// of SQL literals. Only engine-generated integers and decimals flow
    /// through here; user-supplied strings go through `execute` params.
    pub fn insert_rows(
        &self,
        table: &str,
        columns: &str,
        rows: &[String],
        batch: usize,
    ) -> Result<u64> {
        for chunk in rows.chunks(batch.max(1)) {
            let sql = format!(
                "INSERT INTO {} {} VALUES {}",
                table,
                columns,
                chunk.join(", ")
            );
            self.conn.execute_batch(&sql)?;
        }
        Ok(rows.len() as u64)
    }

    /// Bulk update one column keyed by primary key.
    ///
    /// Stages `(id, value)` pairs into a temp table in chunks, then applies
    /// a single `UPDATE .. FROM`. This is the shuffler's write path; it
    /// replaces the row-at-a-time updates of naive implementations.
    pub fn update_column_by_id(
        &self,
        table: &str,
        column: &str,
        column_type: &str,
        rows: &[(i64, String)],
        batch: usize,
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.conn.execute_batch(&format!(
            "CREATE OR REPLACE TEMP TABLE bulk_patch (id BIGINT, v0 {})",
            column_type
        ))?;
        for chunk in rows.chunks(batch.max(1)) {
            let values: Vec<String> = chunk
                .iter()
                .map(|(id, v)| format!("({}, {})", id, v))
                .collect();
            self.conn.execute_batch(&format!(
                "INSERT INTO bulk_patch VALUES {}",
                values.join(", ")
            ))?;
        }
        self.conn.execute_batch(&format!(
            "UPDATE {t} SET {c} = bulk_patch.v0 FROM bulk_patch WHERE {t}.id = bulk_patch.id",
            t = table,
            c = column
        ))?;
        self.conn.execute_batch("DROP TABLE bulk_patch")?;
        Ok(())
    }

    /// Bulk update two `BIGINT` columns keyed by primary key.
    ///
    /// Used by the box filler, which assigns `box_id` and the in-box
    /// position ordinal in one pass.
    pub fn update_two_columns_by_id(
        &self,
        table: &str,
        column_a: &str,
        column_b: &str,
        rows: &[(i64, i64, i64)],
        batch: usize,
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.conn.execute_batch(
            "CREATE OR REPLACE TEMP TABLE bulk_place (id BIGINT, v0 BIGINT, v1 BIGINT)",
        )?;
        for chunk in rows.chunks(batch.max(1)) {
            let values: Vec<String> = chunk
                .iter()
                .map(|(id, a, b)| format!("({}, {}, {})", id, a, b))
                .collect();
            self.conn.execute_batch(&format!(
                "INSERT INTO bulk_place VALUES {}",
                values.join(", ")
            ))?;
        }
        self.conn.execute_batch(&format!(
            "UPDATE {t} SET {a} = bulk_place.v0, {b} = bulk_place.v1 \
             FROM bulk_place WHERE {t}.id = bulk_place.id",
            t = table,
            a = column_a,
            b = column_b
        ))?;
        self.conn.execute_batch("DROP TABLE bulk_place")?;
        Ok(())
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
///
/// Decimals become their canonical string form, which `rust_decimal`'s
/// serde impl deserializes back losslessly.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    match val {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::SmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::Int(n) => serde_json::Value::Number(n.into()),
        ValueRef::BigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UTinyInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::USmallInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::UBigInt(n) => serde_json::Value::Number(n.into()),
        ValueRef::HugeInt(n) => {
            // HugeInt may not fit in i64; try i64, fallback to string
            if let Ok(i) = i64::try_from(n) {
                serde_json::Value::Number(i.into())
            } else {
                serde_json::Value::String(n.to_string())
            }
        }
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Decimal(d) => serde_json::Value::String(d.to_string()),
        ValueRef::Text(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).to_string())
        }
        ValueRef::Blob(bytes) => serde_json::Value::String(format!(
            "blob:{}",
            bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>()
        )),
        _ => {
            // Dates/timestamps are CAST to VARCHAR in the queries that
            // read them; anything else has no JSON mapping here.
            serde_json::Value::Null
        }
    }
}
