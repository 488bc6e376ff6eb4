//! Versioned export/import of a group's order, for backup and transfer
//! between environments.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::history_repo::{self, HistoryAction};
use crate::database::order_repo;
use crate::database::now_ts;
use crate::types::{RollbookError, RollbookResult};

pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMember {
    pub member_id: String,
    pub display_name: String,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderExport {
    pub version: u32,
    pub group_key: String,
    pub exported_at: String,
    pub member_count: usize,
    pub members: Vec<ExportMember>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportReport {
    pub imported_count: usize,
    pub skipped_count: usize,
    pub errors: Vec<String>,
}

/// Export the group's current active order.
pub async fn export_order(pool: &SqlitePool, group_key: &str) -> RollbookResult<OrderExport> {
    let entries = order_repo::get_ordered_members(pool, group_key).await?;
    let members: Vec<ExportMember> = entries
        .into_iter()
        .filter_map(|entry| {
            entry.position.map(|position| ExportMember {
                member_id: entry.member_id,
                display_name: entry.display_name,
                position,
            })
        })
        .collect();

    Ok(OrderExport {
        version: EXPORT_VERSION,
        group_key: group_key.to_string(),
        exported_at: now_ts(),
        member_count: members.len(),
        members,
    })
}

/// Apply an exported order to the same group. Version and group are
/// validated before anything is written; unknown members are skipped and
/// reported rather than resurrected.
pub async fn import_order(
    pool: &SqlitePool,
    group_key: &str,
    export: &OrderExport,
) -> RollbookResult<ImportReport> {
    if export.version != EXPORT_VERSION {
        return Err(RollbookError::Validation(format!(
            "unsupported export version {} (expected {EXPORT_VERSION})",
            export.version
        )));
    }
    if export.group_key != group_key {
        return Err(RollbookError::Validation(format!(
            "export is for group {:?}, not {group_key:?}",
            export.group_key
        )));
    }

    let history_id = Uuid::new_v4().to_string();
    let snapshot_id = order_repo::create_snapshot(pool, group_key, Some(&history_id)).await?;

    let mut report = ImportReport::default();
    let mut updates: Vec<(String, i64)> = Vec::with_capacity(export.members.len());
    for member in &export.members {
        if member.position < 1 {
            report
                .errors
                .push(format!("{}: invalid position {}", member.member_id, member.position));
            continue;
        }
        updates.push((member.member_id.clone(), member.position));
    }

    // batch_update only touches rows that exist; count the misses afterwards.
    let known = order_repo::get_ordered_members(pool, group_key).await?;
    let known_ids: std::collections::HashSet<&str> =
        known.iter().map(|entry| entry.member_id.as_str()).collect();
    let (applied, missing): (Vec<_>, Vec<_>) = updates
        .into_iter()
        .partition(|(member_id, _)| known_ids.contains(member_id.as_str()));
    report.skipped_count = missing.len();
    for (member_id, _) in &missing {
        report.errors.push(format!("{member_id}: not in group"));
    }

    order_repo::batch_update(pool, group_key, &applied).await?;
    report.imported_count = applied.len();

    history_repo::append(
        pool,
        &history_id,
        group_key,
        HistoryAction::Import,
        &format!(
            "Imported order export: {} applied, {} skipped",
            report.imported_count, report.skipped_count
        ),
        report.imported_count as i64,
        Some(&snapshot_id),
    )
    .await?;
    Ok(report)
}

#[cfg(test)]
#[path = "tests/export_tests.rs"]
mod tests;
