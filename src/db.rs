use crate::config::DatabaseConfig;
use crate::error::DbError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row as _, TypeInfo, ValueRef};
use std::path::Path;
use std::time::Duration;

#[cfg(test)]
use std::sync::atomic::{AtomicU64, Ordering};

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[("001_schema.sql", include_str!("migrations/001_schema.sql"))];

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A column value or statement parameter, independent of the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// One result row, detached from the driver.
#[derive(Debug, Clone)]
pub struct Row(Vec<Value>);

impl Row {
    fn value(&self, idx: usize) -> Result<&Value, DbError> {
        self.0.get(idx).ok_or_else(|| DbError::Decode {
            column: idx,
            reason: "column out of range".to_string(),
        })
    }

    pub fn get_i64(&self, idx: usize) -> Result<i64, DbError> {
        match self.value(idx)? {
            Value::Integer(n) => Ok(*n),
            other => Err(decode_error(idx, "integer", other)),
        }
    }

    pub fn get_f64(&self, idx: usize) -> Result<f64, DbError> {
        match self.value(idx)? {
            Value::Real(n) => Ok(*n),
            Value::Integer(n) => Ok(*n as f64),
            other => Err(decode_error(idx, "number", other)),
        }
    }

    pub fn get_text(&self, idx: usize) -> Result<String, DbError> {
        match self.value(idx)? {
            Value::Text(s) => Ok(s.clone()),
            other => Err(decode_error(idx, "text", other)),
        }
    }
}

fn decode_error(column: usize, expected: &str, got: &Value) -> DbError {
    DbError::Decode {
        column,
        reason: format!("expected {expected}, got {got:?}"),
    }
}

fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut values = Vec::with_capacity(row.len());
    for idx in 0..row.len() {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            values.push(Value::Null);
            continue;
        }

        let storage = raw.type_info().name().to_owned();
        let value = match storage.as_str() {
            "INTEGER" => Value::Integer(row.try_get(idx)?),
            "REAL" => Value::Real(row.try_get(idx)?),
            "BLOB" => Value::Blob(row.try_get(idx)?),
            _ => Value::Text(row.try_get(idx)?),
        };
        values.push(value);
    }
    Ok(Row(values))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Statement {
    Read,
    Insert,
    Write,
}

impl Statement {
    fn classify(sql: &str) -> Self {
        let upper = sql.to_ascii_uppercase();
        if upper.contains("RETURNING") {
            return Statement::Read;
        }
        match upper.split_whitespace().next() {
            Some("SELECT" | "WITH" | "PRAGMA" | "VALUES" | "EXPLAIN") => Statement::Read,
            Some("INSERT" | "REPLACE") => Statement::Insert,
            _ => Statement::Write,
        }
    }
}

/// What a statement produced: rows for reads, write metadata for the rest.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub affected_rows: u64,
    /// Rowid of the inserted row; 0 for anything but an INSERT.
    pub insert_id: i64,
}

impl QueryResult {
    pub fn write_result(&self) -> WriteResult {
        WriteResult {
            affected_rows: self.affected_rows,
            insert_id: self.insert_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    pub affected_rows: u64,
    pub insert_id: i64,
}

pub struct Database {
    pool: SqlitePool,
    #[cfg(test)]
    executed: AtomicU64,
}

impl Database {
    async fn is_migration_applied(pool: &SqlitePool, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match sqlx::query(query).bind(name).fetch_optional(pool).await {
            Ok(row) => Ok(row.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(pool: &SqlitePool, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        sqlx::query(query).bind(name).execute(pool).await?;
        Ok(())
    }

    async fn run_migration(pool: &SqlitePool, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(pool, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        sqlx::raw_sql(sql)
            .execute(pool)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(pool, name).await?;
        Ok(())
    }

    pub async fn new(cfg: &DatabaseConfig, data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(cfg.get_path());
        tracing::info!(path = ?path, max_connections = cfg.max_connections, "[db] opening local database");

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(cfg.max_connections.max(1) as u32)
            .acquire_timeout(cfg.acquire_timeout())
            .connect_with(options)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        for (filename, sql) in SYSTEM_MIGRATIONS.iter().chain(MIGRATIONS) {
            Self::run_migration(&pool, filename, sql).await?;
        }

        Ok(Database {
            pool,
            #[cfg(test)]
            executed: AtomicU64::new(0),
        })
    }

    /// Statements sent through `query`/`prepared_query` since startup.
    #[cfg(test)]
    pub(crate) fn executed_statements(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    /// Runs a statement without parameters. `None` means it failed (already logged).
    pub async fn query(&self, sql: &str) -> Option<QueryResult> {
        self.prepared_query(sql, Vec::new()).await
    }

    /// Runs a parameterized statement. `None` means it failed (already logged);
    /// a statement that matched nothing yields an empty `QueryResult`.
    pub async fn prepared_query(&self, sql: &str, params: Vec<Value>) -> Option<QueryResult> {
        #[cfg(test)]
        self.executed.fetch_add(1, Ordering::Relaxed);

        match self.execute(sql, params).await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::error!(error = %e, sql = sql.trim(), "query failed");
                None
            }
        }
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<QueryResult, sqlx::Error> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = match param {
                Value::Null => query.bind(None::<i64>),
                Value::Integer(n) => query.bind(n),
                Value::Real(n) => query.bind(n),
                Value::Text(s) => query.bind(s),
                Value::Blob(b) => query.bind(b),
            };
        }

        let kind = Statement::classify(sql);
        if kind == Statement::Read {
            let rows = query
                .fetch_all(&self.pool)
                .await?
                .iter()
                .map(decode_row)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(QueryResult {
                affected_rows: rows.len() as u64,
                rows,
                insert_id: 0,
            });
        }

        let done = query.execute(&self.pool).await?;
        Ok(QueryResult {
            rows: Vec::new(),
            affected_rows: done.rows_affected(),
            insert_id: if kind == Statement::Insert { done.last_insert_rowid() } else { 0 },
        })
    }
}
