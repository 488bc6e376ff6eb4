use super::*;
use crate::types::MemberRecord;

fn master(id: &str, first: &str, surname: &str) -> MemberRecord {
    MemberRecord {
        primary_id: Some(id.to_string()),
        first_name: Some(first.to_string()),
        surname: Some(surname.to_string()),
        ..Default::default()
    }
}

fn bucket_total(report: &ReconciliationReport) -> usize {
    report.matched.len()
        + report.changed.len()
        + report.new_members.len()
        + report.conflicts.len()
        + report.unidentifiable_new.len()
        + report.unidentifiable_master.len()
        + report.absent_master.len()
}

#[test]
fn test_identical_rosters_fully_matched() {
    let roster = vec![master("101", "John", "Doe"), master("102", "Ama", "Owusu")];
    let report = reconcile(&roster, &roster);

    assert_eq!(report.matched.len(), 2);
    assert!(report.changed.is_empty());
    assert!(report.new_members.is_empty());
    assert!(report.conflicts.is_empty());
}

#[test]
fn test_changed_name_field() {
    // The end-to-end scenario: one changed entry with a name delta.
    let masters = vec![master("101", "John", "Doe")];
    let mut incoming = master("101", "John", "Doe");
    incoming.other_names = Some("K.".to_string());

    let report = reconcile(&[incoming], &masters);

    assert!(report.matched.is_empty());
    assert!(report.new_members.is_empty());
    assert!(report.conflicts.is_empty());
    assert_eq!(report.changed.len(), 1);

    let changed = &report.changed[0];
    assert_eq!(changed.match_type, MatchType::ByCurrentId);
    assert_eq!(changed.deltas.len(), 1);
    assert_eq!(changed.deltas[0].field, "other_names");
    assert_eq!(changed.deltas[0].old, None);
    assert_eq!(changed.deltas[0].new, Some("K.".to_string()));
}

#[test]
fn test_composite_id_matches_either_part() {
    let masters = vec![master("A|B", "Kofi", "Mensah")];

    let by_a = reconcile(&[master("A", "Kofi", "Mensah")], &masters);
    assert_eq!(by_a.changed.len(), 1); // primary_id itself differs: "A" vs "A|B"
    assert!(by_a.new_members.is_empty());

    let by_b = reconcile(&[master("B", "Kofi", "Mensah")], &masters);
    assert_eq!(by_b.changed.len(), 1);
    assert!(by_b.new_members.is_empty());
}

#[test]
fn test_legacy_id_match_is_tagged() {
    let mut old = master("OLD-77", "Esi", "Arthur");
    old.primary_id = None;
    old.legacy_id = Some("OLD-77".to_string());
    let mut current = MemberRecord {
        primary_id: Some("NEW-5".to_string()),
        legacy_id: Some("OLD-77".to_string()),
        ..master("NEW-5", "Esi", "Arthur")
    };
    current.phone = Some("0244000000".to_string());
    let masters = vec![current];

    let report = reconcile(&[old], &masters);
    assert_eq!(report.changed.len(), 1);
    assert_eq!(report.changed[0].match_type, MatchType::ByLegacyId);
}

#[test]
fn test_duplicate_upload_rows_claim_master_once() {
    let masters = vec![master("101", "John", "Doe")];
    let uploads = vec![master("101", "John", "Doe"), master("101", "John", "Doe")];

    let report = reconcile(&uploads, &masters);

    assert_eq!(report.matched.len(), 1);
    assert_eq!(report.new_members.len(), 1);
    // The duplicate gets a fresh sequence continuing past the master roster.
    assert_eq!(report.new_members[0].seq, Some(2));
}

#[test]
fn test_same_name_different_id_is_conflict() {
    let masters = vec![master("101", "Kwame", "Addo")];
    let uploads = vec![master("999", "Kwame", "Addo")];

    let report = reconcile(&uploads, &masters);

    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].display_name, "Kwame Addo");
    assert!(report.new_members.is_empty());
    assert!(report.absent_master.is_empty());
}

#[test]
fn test_conflicted_master_not_claimable_by_id() {
    // Row one drags master 101 into the conflict bucket by name; row two
    // then presents 101's own ID. The master must stay in exactly one
    // bucket, so the second row becomes a new member instead.
    let masters = vec![master("101", "Kwame", "Addo")];
    let uploads = vec![master("999", "Kwame", "Addo"), master("101", "Kwame", "Addo")];

    let report = reconcile(&uploads, &masters);

    assert_eq!(report.conflicts.len(), 1);
    assert!(report.matched.is_empty());
    assert!(report.changed.is_empty());
    assert_eq!(report.new_members.len(), 1);
    assert_eq!(report.new_members[0].primary_id.as_deref(), Some("101"));
    // The conflicted master is accounted for; it must not also show absent.
    assert!(report.absent_master.is_empty());
}

#[test]
fn test_unidentifiable_buckets() {
    let no_id_master = MemberRecord {
        first_name: Some("Adwoa".to_string()),
        ..Default::default()
    };
    let no_id_upload = MemberRecord {
        first_name: Some("Yaa".to_string()),
        ..Default::default()
    };

    let report = reconcile(&[no_id_upload], &[no_id_master]);

    assert_eq!(report.unidentifiable_new.len(), 1);
    assert_eq!(report.unidentifiable_master.len(), 1);
    assert!(report.matched.is_empty());
    assert!(report.new_members.is_empty());
}

#[test]
fn test_disjoint_rosters_cover_every_record_once() {
    let masters = vec![master("1", "A", "One"), master("2", "B", "Two")];
    let uploads = vec![master("3", "C", "Three"), master("4", "D", "Four")];

    let report = reconcile(&uploads, &masters);

    assert_eq!(report.new_members.len(), 2);
    assert_eq!(report.absent_master.len(), 2);
    assert_eq!(bucket_total(&report), 4);

    // Fresh sequence numbers continue from the master roster size.
    assert_eq!(report.new_members[0].seq, Some(3));
    assert_eq!(report.new_members[1].seq, Some(4));
}

#[test]
fn test_new_member_seq_continues_from_master_max() {
    let mut m = master("1", "A", "One");
    m.seq = Some(40);
    let report = reconcile(&[master("9", "Z", "Nine")], &[m]);
    assert_eq!(report.new_members[0].seq, Some(41));
}

#[test]
fn test_blank_and_missing_fields_compare_equal() {
    let mut a = master("101", "John", "Doe");
    a.phone = Some("".to_string());
    let mut b = master("101", "John", "Doe");
    b.phone = None;

    let report = reconcile(&[b], &[a]);
    assert_eq!(report.matched.len(), 1);
    assert!(report.changed.is_empty());
}
