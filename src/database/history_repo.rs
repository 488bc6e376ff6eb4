//! Append-only audit trail of order-mutating operations.
//! Entries are never edited or deleted individually.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;
use std::str::FromStr;

use super::now_ts;

/// What kind of mutation a history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryAction {
    Manual,
    BatchReorder,
    AiReorder,
    Import,
    Reset,
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryAction::Manual => write!(f, "manual"),
            HistoryAction::BatchReorder => write!(f, "batch-reorder"),
            HistoryAction::AiReorder => write!(f, "ai-reorder"),
            HistoryAction::Import => write!(f, "import"),
            HistoryAction::Reset => write!(f, "reset"),
        }
    }
}

impl FromStr for HistoryAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(HistoryAction::Manual),
            "batch-reorder" => Ok(HistoryAction::BatchReorder),
            "ai-reorder" => Ok(HistoryAction::AiReorder),
            "import" => Ok(HistoryAction::Import),
            "reset" => Ok(HistoryAction::Reset),
            _ => Err(format!("Unknown history action: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HistoryEntry {
    pub id: String,
    pub group_key: String,
    pub action: String,
    pub description: String,
    pub affected_count: i64,
    pub snapshot_id: Option<String>,
    pub created_at: String,
}

/// Append one audit record. The caller supplies the id so the snapshot
/// created before the mutation can reference it.
pub async fn append(
    pool: &SqlitePool,
    id: &str,
    group_key: &str,
    action: HistoryAction,
    description: &str,
    affected_count: i64,
    snapshot_id: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO order_history
            (id, group_key, action, description, affected_count, snapshot_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(group_key)
    .bind(action.to_string())
    .bind(description)
    .bind(affected_count)
    .bind(snapshot_id)
    .bind(now_ts())
    .execute(pool)
    .await?;
    Ok(())
}

/// Newest-first history for a group.
pub async fn list(
    pool: &SqlitePool,
    group_key: &str,
    limit: i64,
) -> Result<Vec<HistoryEntry>, sqlx::Error> {
    sqlx::query_as::<_, HistoryEntry>(
        "SELECT * FROM order_history
         WHERE group_key = ?
         ORDER BY created_at DESC
         LIMIT ?",
    )
    .bind(group_key)
    .bind(limit)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
#[path = "tests/history_repo_tests.rs"]
mod tests;
