use super::*;

fn record(primary: Option<&str>, legacy: Option<&str>) -> MemberRecord {
    MemberRecord {
        primary_id: primary.map(str::to_string),
        legacy_id: legacy.map(str::to_string),
        ..Default::default()
    }
}

#[test]
fn test_display_name_joins_parts() {
    let member = MemberRecord {
        first_name: Some("Ama".to_string()),
        other_names: Some("Serwaa".to_string()),
        surname: Some("Boateng".to_string()),
        ..Default::default()
    };
    assert_eq!(member.display_name(), "Ama Serwaa Boateng");
}

#[test]
fn test_display_name_skips_blank_parts() {
    let member = MemberRecord {
        first_name: Some("Kofi".to_string()),
        other_names: Some("  ".to_string()),
        surname: Some("Mensah".to_string()),
        ..Default::default()
    };
    assert_eq!(member.display_name(), "Kofi Mensah");
}

#[test]
fn test_composite_id_split() {
    let member = record(Some("A|B"), None);
    assert_eq!(member.primary_id_parts(), vec!["A", "B"]);
    assert!(member.legacy_id_parts().is_empty());
}

#[test]
fn test_blank_composite_parts_dropped() {
    let member = record(Some(" | X |"), None);
    assert_eq!(member.primary_id_parts(), vec!["X"]);
}

#[test]
fn test_has_identifier() {
    assert!(record(Some("101"), None).has_identifier());
    assert!(record(None, Some("L-7")).has_identifier());
    assert!(!record(None, None).has_identifier());
    assert!(!record(Some(" | "), Some("")).has_identifier());
}
