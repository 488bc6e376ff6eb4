//! Alias learning store: user-confirmed OCR-text → member mappings.
//!
//! Once a human resolves a handwriting variant, future extractions skip
//! fuzzy matching for that exact text. Aliases accumulate for the lifetime
//! of the group's data; nothing expires.

use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::services::matching::normalizer;

use super::now_ts;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AliasRow {
    pub id: String,
    pub group_key: String,
    pub normalized_text: String,
    pub member_id: String,
    pub display_name: String,
    pub usage_count: i64,
    pub created_at: String,
    pub last_used_at: String,
}

/// Upsert a confirmed mapping. Re-confirming the same text bumps
/// `usage_count` and repoints the alias at the confirmed member.
pub async fn save(
    pool: &SqlitePool,
    group_key: &str,
    raw_text: &str,
    member_id: &str,
    display_name: &str,
) -> Result<(), sqlx::Error> {
    let key = normalizer::normalize_alias_key(raw_text);
    let ts = now_ts();
    sqlx::query(
        "INSERT INTO name_aliases
            (id, group_key, normalized_text, member_id, display_name, usage_count, created_at, last_used_at)
         VALUES (?, ?, ?, ?, ?, 1, ?, ?)
         ON CONFLICT(group_key, normalized_text) DO UPDATE SET
            member_id = excluded.member_id,
            display_name = excluded.display_name,
            usage_count = usage_count + 1,
            last_used_at = excluded.last_used_at",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(group_key)
    .bind(&key)
    .bind(member_id)
    .bind(display_name)
    .bind(&ts)
    .bind(&ts)
    .execute(pool)
    .await?;
    Ok(())
}

/// Exact lookup on normalized text.
pub async fn lookup(
    pool: &SqlitePool,
    group_key: &str,
    raw_text: &str,
) -> Result<Option<AliasRow>, sqlx::Error> {
    let key = normalizer::normalize_alias_key(raw_text);
    sqlx::query_as::<_, AliasRow>(
        "SELECT * FROM name_aliases WHERE group_key = ? AND normalized_text = ?",
    )
    .bind(group_key)
    .bind(&key)
    .fetch_optional(pool)
    .await
}

/// Bump usage when the resolver reuses an alias automatically.
pub async fn record_use(
    pool: &SqlitePool,
    group_key: &str,
    raw_text: &str,
) -> Result<(), sqlx::Error> {
    let key = normalizer::normalize_alias_key(raw_text);
    sqlx::query(
        "UPDATE name_aliases SET usage_count = usage_count + 1, last_used_at = ?
         WHERE group_key = ? AND normalized_text = ?",
    )
    .bind(now_ts())
    .bind(group_key)
    .bind(&key)
    .execute(pool)
    .await?;
    Ok(())
}

/// The alias map the resolver consumes: normalized text → member id.
pub async fn load_for_group(
    pool: &SqlitePool,
    group_key: &str,
) -> Result<HashMap<String, String>, sqlx::Error> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT normalized_text, member_id FROM name_aliases WHERE group_key = ?")
            .bind(group_key)
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().collect())
}

#[cfg(test)]
#[path = "tests/alias_repo_tests.rs"]
mod tests;
