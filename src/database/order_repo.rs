//! Order store: the persistent, per-group ordered member list.
//!
//! Invariant (per group, among active entries): positions are unique,
//! positive integers. Multi-step mutations run in one transaction, and
//! `sync`, `batch_update`, and `restore` finish with an integrity pass in
//! the same transaction — the store self-heals instead of trusting callers
//! never to collide.

use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::types::{RollbookError, RollbookResult};

use super::now_ts;

/// Snapshots kept per group; older ones are pruned on each new snapshot.
pub const SNAPSHOT_RETENTION: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderEntry {
    pub id: String,
    pub group_key: String,
    pub member_id: String,
    pub display_name: String,
    pub position: Option<i64>,
    pub is_active: bool,
    pub first_seen_at: String,
    pub last_updated_at: String,
}

/// One member's slot inside a snapshot blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub member_id: String,
    pub display_name: String,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SnapshotRow {
    pub id: String,
    pub group_key: String,
    pub history_id: Option<String>,
    pub entries_json: String,
    pub created_at: String,
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct IntegrityReport {
    pub duplicate_positions: usize,
    pub orphaned_entries: usize,
    pub repaired: usize,
}

impl IntegrityReport {
    pub fn issues(&self) -> usize {
        self.duplicate_positions + self.orphaned_entries
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncOutcome {
    pub reactivated: usize,
    pub deactivated: usize,
    pub appended: usize,
    pub integrity: IntegrityReport,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct RestoreOutcome {
    pub restored: usize,
    pub skipped: usize,
    pub integrity: IntegrityReport,
}

// ── Reads ───────────────────────────────────────────────────────────────────

/// Active entries for a group, in position order.
pub async fn get_ordered_members(
    pool: &SqlitePool,
    group_key: &str,
) -> Result<Vec<OrderEntry>, sqlx::Error> {
    sqlx::query_as::<_, OrderEntry>(
        "SELECT * FROM order_entries
         WHERE group_key = ? AND is_active = 1
         ORDER BY position ASC, member_id ASC",
    )
    .bind(group_key)
    .fetch_all(pool)
    .await
}

/// True when the group has been initialized (any entry, active or not).
pub async fn group_exists(pool: &SqlitePool, group_key: &str) -> Result<bool, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM order_entries WHERE group_key = ?")
        .bind(group_key)
        .fetch_one(pool)
        .await?;
    Ok(row.0 > 0)
}

// ── Seeding & sync ──────────────────────────────────────────────────────────

/// Re-seed a group with dense positions 1..N matching input order.
/// Replaces any prior state for the group (idempotent).
pub async fn initialize(
    pool: &SqlitePool,
    group_key: &str,
    records: &[(String, String)], // (member_id, display_name)
) -> Result<usize, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM order_entries WHERE group_key = ?")
        .bind(group_key)
        .execute(&mut *tx)
        .await?;

    let ts = now_ts();
    for (idx, (member_id, display_name)) in records.iter().enumerate() {
        sqlx::query(
            "INSERT INTO order_entries
                (id, group_key, member_id, display_name, position, is_active, first_seen_at, last_updated_at)
             VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(group_key)
        .bind(member_id)
        .bind(display_name)
        .bind((idx + 1) as i64)
        .bind(&ts)
        .bind(&ts)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(records.len())
}

/// Sync a fresh roster into an existing group: reactivate members still
/// present, soft-delete members that vanished, append genuinely new members
/// after the current maximum position.
pub async fn sync(
    pool: &SqlitePool,
    group_key: &str,
    records: &[(String, String)],
) -> RollbookResult<SyncOutcome> {
    let mut tx = pool.begin().await?;
    let mut outcome = SyncOutcome::default();
    let ts = now_ts();

    let existing: Vec<(String, bool)> =
        sqlx::query_as("SELECT member_id, is_active FROM order_entries WHERE group_key = ?")
            .bind(group_key)
            .fetch_all(&mut *tx)
            .await?;
    let known: std::collections::HashMap<&str, bool> = existing
        .iter()
        .map(|(id, active)| (id.as_str(), *active))
        .collect();
    let incoming: std::collections::HashSet<&str> =
        records.iter().map(|(id, _)| id.as_str()).collect();

    let max_position: Option<i64> = sqlx::query_scalar(
        "SELECT MAX(position) FROM order_entries WHERE group_key = ? AND is_active = 1",
    )
    .bind(group_key)
    .fetch_one(&mut *tx)
    .await?;
    let mut tail = max_position.unwrap_or(0);

    for (member_id, display_name) in records {
        match known.get(member_id.as_str()) {
            Some(true) => {
                // Still present; refresh the display name only.
                sqlx::query(
                    "UPDATE order_entries SET display_name = ?
                     WHERE group_key = ? AND member_id = ?",
                )
                .bind(display_name)
                .bind(group_key)
                .bind(member_id)
                .execute(&mut *tx)
                .await?;
            }
            Some(false) => {
                tail += 1;
                sqlx::query(
                    "UPDATE order_entries
                     SET is_active = 1, display_name = ?, position = ?, last_updated_at = ?
                     WHERE group_key = ? AND member_id = ?",
                )
                .bind(display_name)
                .bind(tail)
                .bind(&ts)
                .bind(group_key)
                .bind(member_id)
                .execute(&mut *tx)
                .await?;
                outcome.reactivated += 1;
            }
            None => {
                tail += 1;
                sqlx::query(
                    "INSERT INTO order_entries
                        (id, group_key, member_id, display_name, position, is_active, first_seen_at, last_updated_at)
                     VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
                )
                .bind(Uuid::new_v4().to_string())
                .bind(group_key)
                .bind(member_id)
                .bind(display_name)
                .bind(tail)
                .bind(&ts)
                .bind(&ts)
                .execute(&mut *tx)
                .await?;
                outcome.appended += 1;
            }
        }
    }

    for (member_id, active) in &existing {
        if *active && !incoming.contains(member_id.as_str()) {
            sqlx::query(
                "UPDATE order_entries SET is_active = 0, last_updated_at = ?
                 WHERE group_key = ? AND member_id = ?",
            )
            .bind(&ts)
            .bind(group_key)
            .bind(member_id)
            .execute(&mut *tx)
            .await?;
            outcome.deactivated += 1;
        }
    }

    outcome.integrity = repair_in_tx(&mut tx, group_key, true).await?;
    tx.commit().await?;
    Ok(outcome)
}

// ── Position updates ────────────────────────────────────────────────────────

/// Move one member to a new position. If another active entry already holds
/// that position the two entries swap, so a manual single-item move never
/// leaves a gap or a collision.
pub async fn update_position(
    pool: &SqlitePool,
    group_key: &str,
    member_id: &str,
    new_position: i64,
) -> RollbookResult<()> {
    if new_position < 1 {
        return Err(RollbookError::Validation(format!(
            "position must be >= 1, got {new_position}"
        )));
    }

    let mut tx = pool.begin().await?;
    let ts = now_ts();

    let mover: Option<(String, Option<i64>)> = sqlx::query_as(
        "SELECT id, position FROM order_entries
         WHERE group_key = ? AND member_id = ? AND is_active = 1",
    )
    .bind(group_key)
    .bind(member_id)
    .fetch_optional(&mut *tx)
    .await?;
    let (mover_id, old_position) = mover.ok_or_else(|| {
        RollbookError::NotFound(format!("active member {member_id} in group {group_key}"))
    })?;

    let occupant: Option<(String,)> = sqlx::query_as(
        "SELECT id FROM order_entries
         WHERE group_key = ? AND position = ? AND is_active = 1 AND id != ?",
    )
    .bind(group_key)
    .bind(new_position)
    .bind(&mover_id)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some((occupant_id,)) = occupant {
        // The mover may be an orphan with no slot; the displaced entry then
        // goes to the tail instead of inheriting the null.
        let displaced_to = match old_position {
            Some(p) => p,
            None => {
                let max: Option<i64> = sqlx::query_scalar(
                    "SELECT MAX(position) FROM order_entries WHERE group_key = ? AND is_active = 1",
                )
                .bind(group_key)
                .fetch_one(&mut *tx)
                .await?;
                max.unwrap_or(0) + 1
            }
        };
        sqlx::query("UPDATE order_entries SET position = ?, last_updated_at = ? WHERE id = ?")
            .bind(displaced_to)
            .bind(&ts)
            .bind(&occupant_id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query("UPDATE order_entries SET position = ?, last_updated_at = ? WHERE id = ?")
        .bind(new_position)
        .bind(&ts)
        .bind(&mover_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Apply many position writes, then repair within the same transaction.
pub async fn batch_update(
    pool: &SqlitePool,
    group_key: &str,
    updates: &[(String, i64)], // (member_id, new_position)
) -> RollbookResult<IntegrityReport> {
    for (member_id, position) in updates {
        if *position < 1 {
            return Err(RollbookError::Validation(format!(
                "position for {member_id} must be >= 1, got {position}"
            )));
        }
    }

    let mut tx = pool.begin().await?;
    let ts = now_ts();
    for (member_id, position) in updates {
        sqlx::query(
            "UPDATE order_entries SET position = ?, last_updated_at = ?
             WHERE group_key = ? AND member_id = ? AND is_active = 1",
        )
        .bind(position)
        .bind(&ts)
        .bind(group_key)
        .bind(member_id)
        .execute(&mut *tx)
        .await?;
    }

    let report = repair_in_tx(&mut tx, group_key, true).await?;
    tx.commit().await?;
    Ok(report)
}

// ── Integrity ───────────────────────────────────────────────────────────────

/// Scan a group's active entries for duplicate or orphaned positions and,
/// when `auto_repair` is set, fix them: for each duplicate set the most
/// recently updated entry keeps the slot, and the losers plus all orphans
/// move to trailing positions in recency order.
pub async fn validate_and_repair(
    pool: &SqlitePool,
    group_key: &str,
    auto_repair: bool,
) -> RollbookResult<IntegrityReport> {
    let mut tx = pool.begin().await?;
    let report = repair_in_tx(&mut tx, group_key, auto_repair).await?;
    tx.commit().await?;
    Ok(report)
}

pub(crate) async fn repair_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    group_key: &str,
    auto_repair: bool,
) -> RollbookResult<IntegrityReport> {
    let mut report = IntegrityReport::default();

    // Most recent first, so the keeper of a duplicate slot is whichever
    // entry the user touched last.
    let entries: Vec<(String, Option<i64>, String)> = sqlx::query_as(
        "SELECT id, position, last_updated_at FROM order_entries
         WHERE group_key = ? AND is_active = 1
         ORDER BY last_updated_at DESC, id ASC",
    )
    .bind(group_key)
    .fetch_all(&mut **tx)
    .await?;

    let mut seen = std::collections::HashSet::new();
    let mut displaced: Vec<String> = Vec::new(); // in recency order
    let mut max_valid = 0_i64;

    for (id, position, _) in &entries {
        match position {
            Some(p) if *p >= 1 => {
                if seen.insert(*p) {
                    max_valid = max_valid.max(*p);
                } else {
                    report.duplicate_positions += 1;
                    displaced.push(id.clone());
                }
            }
            _ => {
                report.orphaned_entries += 1;
                displaced.push(id.clone());
            }
        }
    }

    if !auto_repair || displaced.is_empty() {
        return Ok(report);
    }

    let ts = now_ts();
    for id in displaced {
        max_valid += 1;
        sqlx::query("UPDATE order_entries SET position = ?, last_updated_at = ? WHERE id = ?")
            .bind(max_valid)
            .bind(&ts)
            .bind(&id)
            .execute(&mut **tx)
            .await?;
        report.repaired += 1;
    }

    log::warn!(
        "Repaired order for group {group_key}: {} duplicate position(s), {} orphan(s)",
        report.duplicate_positions,
        report.orphaned_entries
    );
    Ok(report)
}

// ── Snapshots ───────────────────────────────────────────────────────────────

/// Immutable copy of the group's current active entries, tagged with the
/// history entry that triggered it. Prunes beyond the retention count.
pub async fn create_snapshot(
    pool: &SqlitePool,
    group_key: &str,
    history_id: Option<&str>,
) -> RollbookResult<String> {
    let entries = get_ordered_members(pool, group_key).await?;
    let blob: Vec<SnapshotEntry> = entries
        .iter()
        .filter_map(|entry| {
            entry.position.map(|position| SnapshotEntry {
                member_id: entry.member_id.clone(),
                display_name: entry.display_name.clone(),
                position,
            })
        })
        .collect();
    let entries_json = serde_json::to_string(&blob)?;

    let snapshot_id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO order_snapshots (id, group_key, history_id, entries_json, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&snapshot_id)
    .bind(group_key)
    .bind(history_id)
    .bind(&entries_json)
    .bind(now_ts())
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "DELETE FROM order_snapshots
         WHERE group_key = ?
           AND id NOT IN (
               SELECT id FROM order_snapshots
               WHERE group_key = ?
               ORDER BY created_at DESC
               LIMIT ?
           )",
    )
    .bind(group_key)
    .bind(group_key)
    .bind(SNAPSHOT_RETENTION)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(snapshot_id)
}

pub async fn get_snapshot(
    pool: &SqlitePool,
    snapshot_id: &str,
) -> Result<Option<SnapshotRow>, sqlx::Error> {
    sqlx::query_as::<_, SnapshotRow>("SELECT * FROM order_snapshots WHERE id = ?")
        .bind(snapshot_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_snapshots(
    pool: &SqlitePool,
    group_key: &str,
) -> Result<Vec<SnapshotRow>, sqlx::Error> {
    sqlx::query_as::<_, SnapshotRow>(
        "SELECT * FROM order_snapshots WHERE group_key = ? ORDER BY created_at DESC",
    )
    .bind(group_key)
    .fetch_all(pool)
    .await
}

/// Overwrite live positions from a snapshot. Members removed since the
/// snapshot are not resurrected; members soft-deleted since are reactivated
/// at their snapshot position. Finishes with an integrity pass.
pub async fn restore(pool: &SqlitePool, snapshot_id: &str) -> RollbookResult<RestoreOutcome> {
    let snapshot = get_snapshot(pool, snapshot_id)
        .await?
        .ok_or_else(|| RollbookError::NotFound(format!("snapshot {snapshot_id}")))?;
    let entries: Vec<SnapshotEntry> = serde_json::from_str(&snapshot.entries_json)?;

    let mut tx = pool.begin().await?;
    let mut outcome = RestoreOutcome::default();
    let ts = now_ts();

    for entry in &entries {
        let result = sqlx::query(
            "UPDATE order_entries SET position = ?, is_active = 1, last_updated_at = ?
             WHERE group_key = ? AND member_id = ?",
        )
        .bind(entry.position)
        .bind(&ts)
        .bind(&snapshot.group_key)
        .bind(&entry.member_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            outcome.skipped += 1;
        } else {
            outcome.restored += 1;
        }
    }

    outcome.integrity = repair_in_tx(&mut tx, &snapshot.group_key, true).await?;
    tx.commit().await?;
    Ok(outcome)
}

#[cfg(test)]
#[path = "tests/order_repo_tests.rs"]
mod tests;
