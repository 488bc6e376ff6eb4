//! Schema for the order store, history log, and alias store.
//! Shared by embedders and the in-memory test pools.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS order_entries (
        id TEXT PRIMARY KEY,
        group_key TEXT NOT NULL,
        member_id TEXT NOT NULL,
        display_name TEXT NOT NULL,
        position INTEGER,
        is_active BOOLEAN DEFAULT 1,
        first_seen_at TEXT NOT NULL,
        last_updated_at TEXT NOT NULL,
        UNIQUE(group_key, member_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_order_entries_group
        ON order_entries(group_key, is_active, position)",
    "CREATE TABLE IF NOT EXISTS order_snapshots (
        id TEXT PRIMARY KEY,
        group_key TEXT NOT NULL,
        history_id TEXT,
        entries_json TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_order_snapshots_group
        ON order_snapshots(group_key, created_at)",
    "CREATE TABLE IF NOT EXISTS order_history (
        id TEXT PRIMARY KEY,
        group_key TEXT NOT NULL,
        action TEXT NOT NULL,
        description TEXT NOT NULL,
        affected_count INTEGER DEFAULT 0,
        snapshot_id TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_order_history_group
        ON order_history(group_key, created_at)",
    "CREATE TABLE IF NOT EXISTS name_aliases (
        id TEXT PRIMARY KEY,
        group_key TEXT NOT NULL,
        normalized_text TEXT NOT NULL,
        member_id TEXT NOT NULL,
        display_name TEXT NOT NULL,
        usage_count INTEGER DEFAULT 1,
        created_at TEXT NOT NULL,
        last_used_at TEXT NOT NULL,
        UNIQUE(group_key, normalized_text)
    )",
];

/// Create all tables and indexes (idempotent).
pub async fn create_all(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in CREATE_TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Open (creating if missing) a database file and ensure the schema exists.
pub async fn open_pool(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    let opts = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;
    create_all(&pool).await?;
    Ok(pool)
}

/// In-memory pool with the full schema, for tests and ephemeral embedders.
pub async fn open_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await?;
    create_all(&pool).await?;
    Ok(pool)
}
