use super::*;
use crate::types::{CandidateName, MemberRecord};
use std::collections::HashMap;

fn member(id: &str, first: &str, surname: &str, seq: i64) -> MemberRecord {
    MemberRecord {
        primary_id: Some(id.to_string()),
        first_name: Some(first.to_string()),
        surname: Some(surname.to_string()),
        seq: Some(seq),
        ..Default::default()
    }
}

fn roster() -> Vec<MemberRecord> {
    vec![
        member("101", "Kofi", "Mensah", 1),
        member("102", "Ama", "Boateng", 2),
        member("103", "Yaw", "Asante", 3),
    ]
}

#[test]
fn test_exact_names_resolve() {
    let candidates = vec![
        CandidateName::new("Kofi Mensah"),
        CandidateName::new("Ama Boateng"),
    ];
    let outcome = resolve(
        &candidates,
        &roster(),
        &HashMap::new(),
        &ResolveOptions::default(),
    )
    .unwrap();

    assert_eq!(outcome.matched.len(), 2);
    assert!(outcome.unmatched.is_empty());
    assert_eq!(outcome.matched[0].member_id.as_deref(), Some("101"));
    assert_eq!(outcome.matched[1].member_id.as_deref(), Some("102"));
    assert_eq!(outcome.matched[0].source, MatchSource::Assignment);
}

#[test]
fn test_alias_fast_path() {
    let mut aliases = HashMap::new();
    // A handwriting variant that fuzzy matching alone would reject.
    aliases.insert("maame efya".to_string(), "102".to_string());

    let candidates = vec![CandidateName::new("Maame  EFYA")];
    let outcome = resolve(
        &candidates,
        &roster(),
        &aliases,
        &ResolveOptions::default(),
    )
    .unwrap();

    assert_eq!(outcome.matched.len(), 1);
    let hit = &outcome.matched[0];
    assert_eq!(hit.source, MatchSource::Alias);
    assert_eq!(hit.member_id.as_deref(), Some("102"));
    assert_eq!(hit.score, 1.0);
}

#[test]
fn test_no_double_claim_on_shared_best_match() {
    // Both rows best-match "Kofi Mensah"; one-to-one assignment forbids
    // claiming him twice, and the leftover falls below threshold.
    let candidates = vec![
        CandidateName::new("Kofi Mensah"),
        CandidateName::new("Kofi Mensa"),
    ];
    let outcome = resolve(
        &candidates,
        &roster(),
        &HashMap::new(),
        &ResolveOptions::default(),
    )
    .unwrap();

    let claimed: Vec<usize> = outcome.matched.iter().map(|m| m.roster_index).collect();
    let mut unique = claimed.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(claimed.len(), unique.len(), "roster entry claimed twice");
}

#[test]
fn test_below_threshold_returns_suggestions() {
    // Half the name matches (0.5), below the 0.55 default threshold: the
    // candidate stays unmatched but "Kofi Mensah" shows up as a suggestion
    // for the manual-resolution dialog.
    let candidates = vec![CandidateName::new("Kofi Boadu")];
    let outcome = resolve(
        &candidates,
        &roster(),
        &HashMap::new(),
        &ResolveOptions::default(),
    )
    .unwrap();

    assert!(outcome.matched.is_empty());
    assert_eq!(outcome.unmatched.len(), 1);
    let unmatched = &outcome.unmatched[0];
    assert_eq!(unmatched.text, "Kofi Boadu");
    assert_eq!(unmatched.suggestions.len(), 1);
    assert_eq!(unmatched.suggestions[0].display_name, "Kofi Mensah");
    assert!((unmatched.suggestions[0].score - 0.5).abs() < 1e-9);
}

#[test]
fn test_position_hint_breaks_ties() {
    // Two members with the same name; the ledger row hints decide who is who.
    let twins = vec![
        member("201", "Ama", "Serwaa", 1),
        member("202", "Ama", "Serwaa", 2),
    ];
    let candidates = vec![
        CandidateName::with_hint("Ama Serwaa", 2),
        CandidateName::with_hint("Ama Serwaa", 1),
    ];
    let outcome = resolve(
        &candidates,
        &twins,
        &HashMap::new(),
        &ResolveOptions::default(),
    )
    .unwrap();

    assert_eq!(outcome.matched.len(), 2);
    assert_eq!(outcome.matched[0].member_id.as_deref(), Some("202"));
    assert_eq!(outcome.matched[1].member_id.as_deref(), Some("201"));
}

#[test]
fn test_alias_claim_excluded_from_matrix_pass() {
    let mut aliases = HashMap::new();
    aliases.insert("kofi mensah".to_string(), "101".to_string());

    // Candidate 0 claims 101 via alias; candidate 1's fuzzy best is also
    // 101 but must settle elsewhere or go unmatched.
    let candidates = vec![
        CandidateName::new("Kofi Mensah"),
        CandidateName::new("Kofi Mensah"),
    ];
    let outcome = resolve(
        &candidates,
        &roster(),
        &aliases,
        &ResolveOptions::default(),
    )
    .unwrap();

    let alias_hits: Vec<_> = outcome
        .matched
        .iter()
        .filter(|m| m.source == MatchSource::Alias)
        .collect();
    assert_eq!(alias_hits.len(), 1);
    assert_eq!(alias_hits[0].candidate_index, 0);
    for hit in &outcome.matched {
        if hit.source == MatchSource::Assignment {
            assert_ne!(hit.member_id.as_deref(), Some("101"));
        }
    }
}

#[test]
fn test_empty_roster() {
    let candidates = vec![CandidateName::new("Kofi Mensah")];
    let outcome = resolve(
        &candidates,
        &[],
        &HashMap::new(),
        &ResolveOptions::default(),
    )
    .unwrap();
    assert!(outcome.matched.is_empty());
    assert_eq!(outcome.unmatched.len(), 1);
    assert!(outcome.unmatched[0].suggestions.is_empty());
}
