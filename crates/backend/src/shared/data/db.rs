use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr, SqlxSqliteConnector, Statement};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::shared::config::{self, Config};

const CREATE_BATCH_TABLE: &str = r#"
    CREATE TABLE a001_batch (
        id TEXT PRIMARY KEY NOT NULL,
        product_name TEXT NOT NULL,
        origin TEXT NOT NULL,
        harvest_date TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
"#;

const CREATE_EVENT_TABLE: &str = r#"
    CREATE TABLE a002_batch_event (
        id TEXT PRIMARY KEY NOT NULL,
        batch_id TEXT NOT NULL REFERENCES a001_batch(id) ON DELETE CASCADE,
        event_type TEXT NOT NULL,
        description TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        location TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
"#;

const CREATE_EVENT_TIMELINE_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_a002_batch_event_timeline
        ON a002_batch_event (batch_id, timestamp, created_at);
"#;

/// Open the SQLite pool described by `config` and make sure the schema exists.
///
/// Every pooled connection has foreign keys enabled (cascade relies on it)
/// and a busy timeout, so lock contention surfaces as an error instead of
/// blocking forever.
pub async fn initialize_database(config: &Config) -> anyhow::Result<DatabaseConnection> {
    let db_path = config::get_database_path(config);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::info!("Opening database at {}", db_path.display());

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(config.database.busy_timeout());

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect_with(options)
        .await?;

    let conn = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);
    ensure_schema(&conn).await?;
    Ok(conn)
}

/// Create missing tables. Safe to call on every start.
pub async fn ensure_schema(conn: &DatabaseConnection) -> Result<(), DbErr> {
    if !table_exists(conn, "a001_batch").await? {
        tracing::info!("Creating a001_batch table");
        execute(conn, CREATE_BATCH_TABLE).await?;
    }

    if !table_exists(conn, "a002_batch_event").await? {
        tracing::info!("Creating a002_batch_event table");
        execute(conn, CREATE_EVENT_TABLE).await?;
    }

    execute(conn, CREATE_EVENT_TIMELINE_INDEX).await?;
    Ok(())
}

async fn table_exists(conn: &DatabaseConnection, name: &str) -> Result<bool, DbErr> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type='table' AND name = ?;",
            [name.into()],
        ))
        .await?;
    Ok(!rows.is_empty())
}

async fn execute(conn: &DatabaseConnection, sql: &str) -> Result<(), DbErr> {
    conn.execute(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
        .await?;
    Ok(())
}

/// Private in-memory database with the schema applied.
///
/// A single pooled connection that never expires: every connection to
/// `:memory:` is a separate database.
#[cfg(test)]
pub async fn connect_in_memory() -> DatabaseConnection {
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("in-memory sqlite pool");

    let conn = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);
    ensure_schema(&conn).await.expect("schema bootstrap");
    conn
}

/// File-backed database under `dir`, opened through [`initialize_database`]
/// with the default pool settings: several connections, WAL, the given
/// busy timeout.
#[cfg(test)]
pub async fn connect_file(dir: &std::path::Path, busy_timeout_secs: u64) -> DatabaseConnection {
    let mut cfg = config::parse_config(config::DEFAULT_CONFIG).expect("default config");
    cfg.database.path = dir.join("puretrace.db").to_string_lossy().into_owned();
    cfg.database.busy_timeout_secs = busy_timeout_secs;
    initialize_database(&cfg).await.expect("file-backed sqlite pool")
}
