//! Full workflow: re-uploaded roster reconciliation, OCR page resolution
//! with alias learning, order sync, and snapshot undo.

use anyhow::Result;

use rollbook::database::history_repo::HistoryAction;
use rollbook::database::schema;
use rollbook::services::matching::resolver::{MatchSource, ResolveOptions};
use rollbook::services::order_service;
use rollbook::services::reconcile;
use rollbook::types::{CandidateName, MemberRecord};

fn member(id: &str, first: &str, surname: &str) -> MemberRecord {
    MemberRecord {
        primary_id: Some(id.to_string()),
        first_name: Some(first.to_string()),
        surname: Some(surname.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_reupload_then_ocr_page_then_undo() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let pool = schema::open_memory_pool().await?;
    let group = "bethel";

    // 1. Master roster is seeded into the order store.
    let master = vec![
        member("101", "Kofi", "Mensah"),
        member("102", "Ama", "Boateng"),
        member("103", "Yaw", "Asante"),
    ];
    order_service::seed_order(&pool, group, &master).await?;

    // 2. A corrected spreadsheet comes back: 101 gained a middle name,
    //    104 is new, 103 is unchanged, 102 is missing.
    let mut changed = member("101", "Kofi", "Mensah");
    changed.other_names = Some("Kwadwo".to_string());
    let upload = vec![changed, member("103", "Yaw", "Asante"), member("104", "Esi", "Arthur")];

    let report = reconcile::reconcile(&upload, &master);
    assert_eq!(report.changed.len(), 1);
    assert_eq!(report.changed[0].deltas[0].field, "other_names");
    assert_eq!(report.matched.len(), 1);
    assert_eq!(report.new_members.len(), 1);
    assert_eq!(report.new_members[0].seq, Some(4));
    assert_eq!(report.absent_master.len(), 1);

    // 3. The merged roster is synced into the order store.
    let merged = vec![
        member("101", "Kofi", "Mensah"),
        member("103", "Yaw", "Asante"),
        member("104", "Esi", "Arthur"),
    ];
    let outcome = order_service::sync_roster(&pool, group, &merged).await?;
    assert_eq!(outcome.appended, 1);
    assert_eq!(outcome.deactivated, 1);

    // 4. An OCR'd attendance page is resolved against the live roster.
    let roster: Vec<MemberRecord> = vec![
        member("101", "Kofi", "Mensah"),
        member("103", "Yaw", "Asante"),
        member("104", "Esi", "Arthur"),
    ];
    let page = vec![
        CandidateName::new("Elder Kofi Mensah"),
        CandidateName::new("Yao Asante"),
        CandidateName::new("Maame Efya"),
    ];
    let outcome =
        order_service::resolve_candidates(&pool, group, &page, &roster, &ResolveOptions::default())
            .await?;
    assert_eq!(outcome.matched.len(), 2);
    assert_eq!(outcome.unmatched.len(), 1);

    // 5. A human resolves the leftover; next pass hits the alias store.
    order_service::record_confirmation(&pool, group, "Maame Efya", "104", "Esi Arthur").await?;
    let outcome =
        order_service::resolve_candidates(&pool, group, &page, &roster, &ResolveOptions::default())
            .await?;
    assert_eq!(outcome.matched.len(), 3);
    assert!(outcome
        .matched
        .iter()
        .any(|m| m.source == MatchSource::Alias && m.member_id.as_deref() == Some("104")));

    // 6. A batch reorder is applied, then undone via its guard snapshot.
    let before: Vec<String> = order_service::get_ordered_members(&pool, group)
        .await?
        .into_iter()
        .map(|e| e.member_id)
        .collect();
    order_service::reorder(
        &pool,
        group,
        &[("104".to_string(), 1), ("101".to_string(), 4)],
        HistoryAction::BatchReorder,
        "Match ledger page order",
    )
    .await?;

    let history = order_service::list_history(&pool, group, 1).await?;
    let snapshot_id = history[0].snapshot_id.clone().expect("guard snapshot");
    order_service::undo_to_snapshot(&pool, &snapshot_id).await?;

    let after: Vec<String> = order_service::get_ordered_members(&pool, group)
        .await?
        .into_iter()
        .map(|e| e.member_id)
        .collect();
    assert_eq!(before, after);

    // Every mutation left an audit record.
    let history = order_service::list_history(&pool, group, 20).await?;
    assert_eq!(history.len(), 4); // seed, sync, reorder, undo
    Ok(())
}
