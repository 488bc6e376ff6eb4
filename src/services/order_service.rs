//! Order orchestration: every mutation follows snapshot → mutate → log, so
//! undo stays possible even if the process dies right after the write.
//!
//! The history id is minted first and stamped onto the snapshot, then the
//! history row is appended last, referencing the same snapshot.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::history_repo::{self, HistoryAction, HistoryEntry};
use crate::database::order_repo::{self, IntegrityReport, OrderEntry, RestoreOutcome, SyncOutcome};
use crate::database::{alias_repo, order_repo::SnapshotRow};
use crate::services::matching::resolver::{self, MatchSource, ResolveOptions, ResolveOutcome};
use crate::types::{CandidateName, MemberRecord, RollbookResult};

/// Active members of a group in ledger order.
pub async fn get_ordered_members(
    pool: &SqlitePool,
    group_key: &str,
) -> RollbookResult<Vec<OrderEntry>> {
    Ok(order_repo::get_ordered_members(pool, group_key).await?)
}

pub async fn list_history(
    pool: &SqlitePool,
    group_key: &str,
    limit: i64,
) -> RollbookResult<Vec<HistoryEntry>> {
    Ok(history_repo::list(pool, group_key, limit).await?)
}

pub async fn list_snapshots(
    pool: &SqlitePool,
    group_key: &str,
) -> RollbookResult<Vec<SnapshotRow>> {
    Ok(order_repo::list_snapshots(pool, group_key).await?)
}

/// Seed (or re-seed) a group's order from a roster, positions 1..N.
pub async fn seed_order(
    pool: &SqlitePool,
    group_key: &str,
    roster: &[MemberRecord],
) -> RollbookResult<usize> {
    let records = roster_pairs(roster);
    let history_id = Uuid::new_v4().to_string();

    // Nothing to snapshot on first seed.
    let snapshot_id = if order_repo::group_exists(pool, group_key).await? {
        Some(order_repo::create_snapshot(pool, group_key, Some(&history_id)).await?)
    } else {
        None
    };

    let count = order_repo::initialize(pool, group_key, &records).await?;
    history_repo::append(
        pool,
        &history_id,
        group_key,
        HistoryAction::Import,
        &format!("Seeded order with {count} member(s)"),
        count as i64,
        snapshot_id.as_deref(),
    )
    .await?;
    log::info!("Seeded order for group {group_key}: {count} member(s)");
    Ok(count)
}

/// Sync a re-uploaded roster into the group's existing order.
pub async fn sync_roster(
    pool: &SqlitePool,
    group_key: &str,
    roster: &[MemberRecord],
) -> RollbookResult<SyncOutcome> {
    let records = roster_pairs(roster);
    let history_id = Uuid::new_v4().to_string();
    let snapshot_id = order_repo::create_snapshot(pool, group_key, Some(&history_id)).await?;

    let outcome = order_repo::sync(pool, group_key, &records).await?;
    history_repo::append(
        pool,
        &history_id,
        group_key,
        HistoryAction::Import,
        &sync_description(&outcome),
        (outcome.appended + outcome.reactivated + outcome.deactivated) as i64,
        Some(&snapshot_id),
    )
    .await?;
    Ok(outcome)
}

/// Move a single member (swap semantics when the target slot is taken).
pub async fn move_member(
    pool: &SqlitePool,
    group_key: &str,
    member_id: &str,
    new_position: i64,
) -> RollbookResult<()> {
    let history_id = Uuid::new_v4().to_string();
    let snapshot_id = order_repo::create_snapshot(pool, group_key, Some(&history_id)).await?;

    order_repo::update_position(pool, group_key, member_id, new_position).await?;
    history_repo::append(
        pool,
        &history_id,
        group_key,
        HistoryAction::Manual,
        &format!("Moved {member_id} to position {new_position}"),
        1,
        Some(&snapshot_id),
    )
    .await?;
    Ok(())
}

/// Apply a batch of position writes in one transaction.
/// `action` distinguishes user drag-reorders from AI-proposed ones.
pub async fn reorder(
    pool: &SqlitePool,
    group_key: &str,
    updates: &[(String, i64)],
    action: HistoryAction,
    description: &str,
) -> RollbookResult<IntegrityReport> {
    let history_id = Uuid::new_v4().to_string();
    let snapshot_id = order_repo::create_snapshot(pool, group_key, Some(&history_id)).await?;

    let report = order_repo::batch_update(pool, group_key, updates).await?;
    history_repo::append(
        pool,
        &history_id,
        group_key,
        action,
        description,
        updates.len() as i64,
        Some(&snapshot_id),
    )
    .await?;
    Ok(report)
}

/// Roll a group back to a snapshot. The restore is itself a logged,
/// snapshot-guarded mutation, so it can be undone too.
pub async fn undo_to_snapshot(
    pool: &SqlitePool,
    snapshot_id: &str,
) -> RollbookResult<RestoreOutcome> {
    let snapshot = order_repo::get_snapshot(pool, snapshot_id)
        .await?
        .ok_or_else(|| crate::types::RollbookError::NotFound(format!("snapshot {snapshot_id}")))?;
    let group_key = snapshot.group_key.clone();

    let history_id = Uuid::new_v4().to_string();
    let guard_snapshot = order_repo::create_snapshot(pool, &group_key, Some(&history_id)).await?;

    let outcome = order_repo::restore(pool, snapshot_id).await?;
    history_repo::append(
        pool,
        &history_id,
        &group_key,
        HistoryAction::Manual,
        &format!(
            "Restored snapshot {snapshot_id}: {} position(s) restored, {} skipped",
            outcome.restored, outcome.skipped
        ),
        outcome.restored as i64,
        Some(&guard_snapshot),
    )
    .await?;
    Ok(outcome)
}

/// Reset a group's order back to roster order (dense 1..N).
pub async fn reset_order(
    pool: &SqlitePool,
    group_key: &str,
    roster: &[MemberRecord],
) -> RollbookResult<usize> {
    let records = roster_pairs(roster);
    let history_id = Uuid::new_v4().to_string();
    let snapshot_id = order_repo::create_snapshot(pool, group_key, Some(&history_id)).await?;

    let count = order_repo::initialize(pool, group_key, &records).await?;
    history_repo::append(
        pool,
        &history_id,
        group_key,
        HistoryAction::Reset,
        &format!("Reset order to roster sequence ({count} member(s))"),
        count as i64,
        Some(&snapshot_id),
    )
    .await?;
    Ok(count)
}

/// Run the integrity scan on demand. Repairs are audit-logged; a clean scan
/// leaves no history.
pub async fn validate_order(
    pool: &SqlitePool,
    group_key: &str,
    auto_repair: bool,
) -> RollbookResult<IntegrityReport> {
    let report = order_repo::validate_and_repair(pool, group_key, auto_repair).await?;
    if report.repaired > 0 {
        history_repo::append(
            pool,
            &Uuid::new_v4().to_string(),
            group_key,
            HistoryAction::Manual,
            &format!(
                "Integrity repair: {} duplicate position(s), {} orphan(s)",
                report.duplicate_positions, report.orphaned_entries
            ),
            report.repaired as i64,
            None,
        )
        .await?;
    }
    Ok(report)
}

/// Resolve one page of extracted names against a roster, consulting the
/// group's learned aliases first and bumping usage counts on alias hits.
pub async fn resolve_candidates(
    pool: &SqlitePool,
    group_key: &str,
    candidates: &[CandidateName],
    roster: &[MemberRecord],
    options: &ResolveOptions,
) -> RollbookResult<ResolveOutcome> {
    let aliases = alias_repo::load_for_group(pool, group_key).await?;
    let outcome = resolver::resolve(candidates, roster, &aliases, options)?;

    for hit in &outcome.matched {
        if hit.source == MatchSource::Alias {
            alias_repo::record_use(pool, group_key, &candidates[hit.candidate_index].text).await?;
        }
    }
    log::debug!(
        "Resolved {}/{} candidate(s) for group {group_key}",
        outcome.matched.len(),
        candidates.len()
    );
    Ok(outcome)
}

/// Persist a human-confirmed candidate → member resolution so the next
/// extraction of the same handwriting skips fuzzy matching.
pub async fn record_confirmation(
    pool: &SqlitePool,
    group_key: &str,
    raw_text: &str,
    member_id: &str,
    display_name: &str,
) -> RollbookResult<()> {
    alias_repo::save(pool, group_key, raw_text, member_id, display_name).await?;
    log::debug!("Learned alias for group {group_key}: {raw_text:?} -> {member_id}");
    Ok(())
}

fn roster_pairs(roster: &[MemberRecord]) -> Vec<(String, String)> {
    roster
        .iter()
        .map(|member| {
            let id = member
                .primary_id
                .clone()
                .or_else(|| member.legacy_id.clone())
                .unwrap_or_default();
            (id, member.display_name())
        })
        .collect()
}

fn sync_description(outcome: &SyncOutcome) -> String {
    format!(
        "Synced roster: {} appended, {} reactivated, {} deactivated",
        outcome.appended, outcome.reactivated, outcome.deactivated
    )
}

#[cfg(test)]
#[path = "tests/order_service_tests.rs"]
mod tests;
