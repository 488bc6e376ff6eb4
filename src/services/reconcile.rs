//! Roster reconciliation: diff an uploaded roster against the master roster
//! using multi-key identity resolution (current ID, legacy ID, composite
//! pipe-delimited IDs).
//!
//! Missing identifiers and ambiguous names are data-quality conditions, not
//! errors: every record lands in exactly one report bucket and nothing is
//! thrown.

use serde::Serialize;
use std::collections::HashMap;

use crate::services::matching::normalizer;
use crate::types::MemberRecord;

/// Which master index found the match. Downstream UI flags legacy-ID links
/// as "linked via old ID".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ByCurrentId,
    ByLegacyId,
}

/// One tracked field that differs between master and upload.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDelta {
    pub field: &'static str,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Identity preserved, at least one tracked field changed.
#[derive(Debug, Clone, Serialize)]
pub struct ChangedMember {
    pub master: MemberRecord,
    pub incoming: MemberRecord,
    pub match_type: MatchType,
    pub deltas: Vec<FieldDelta>,
}

/// Same display name on both sides but different identifiers — ambiguous,
/// needs a human decision.
#[derive(Debug, Clone, Serialize)]
pub struct NameConflict {
    pub display_name: String,
    pub master: MemberRecord,
    pub incoming: MemberRecord,
}

#[derive(Debug, Default, Serialize)]
pub struct ReconciliationReport {
    /// Identity preserved, no tracked field changed. Holds the master record.
    pub matched: Vec<MemberRecord>,
    pub changed: Vec<ChangedMember>,
    /// Upload records with a usable ID but no master counterpart; assigned
    /// fresh sequence numbers continuing from the master maximum.
    pub new_members: Vec<MemberRecord>,
    pub conflicts: Vec<NameConflict>,
    pub unidentifiable_new: Vec<MemberRecord>,
    pub unidentifiable_master: Vec<MemberRecord>,
    /// Identifiable master records no upload record claimed.
    pub absent_master: Vec<MemberRecord>,
}

/// Fields the diff inspects. Everything else rides along in `extra`.
fn tracked_fields(record: &MemberRecord) -> [(&'static str, &Option<String>); 11] {
    [
        ("first_name", &record.first_name),
        ("surname", &record.surname),
        ("other_names", &record.other_names),
        ("phone", &record.phone),
        ("email", &record.email),
        ("gender", &record.gender),
        ("date_of_birth", &record.date_of_birth),
        ("residence", &record.residence),
        ("occupation", &record.occupation),
        ("primary_id", &record.primary_id),
        ("legacy_id", &record.legacy_id),
    ]
}

fn normalized(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Per-field deltas between a master record and its uploaded counterpart.
/// Blank and absent values compare equal.
pub fn diff_tracked_fields(master: &MemberRecord, incoming: &MemberRecord) -> Vec<FieldDelta> {
    tracked_fields(master)
        .into_iter()
        .zip(tracked_fields(incoming))
        .filter_map(|((field, old), (_, new))| {
            if normalized(old) == normalized(new) {
                return None;
            }
            Some(FieldDelta {
                field,
                old: old.clone(),
                new: new.clone(),
            })
        })
        .collect()
}

/// Diff an uploaded roster against the master roster.
///
/// Lookup order per upload record: its `primary_id` parts, then its
/// `legacy_id` parts, each checked against the master current-ID index
/// before the legacy-ID index; the first hit wins. A master record claimed
/// by an earlier upload row is never reused — a duplicate row in a bad
/// upload becomes a new member instead of silently merging.
pub fn reconcile(
    new_roster: &[MemberRecord],
    master_roster: &[MemberRecord],
) -> ReconciliationReport {
    let mut report = ReconciliationReport::default();

    let mut by_current_id: HashMap<String, usize> = HashMap::new();
    let mut by_legacy_id: HashMap<String, usize> = HashMap::new();
    let mut by_display_name: HashMap<String, usize> = HashMap::new();
    // Masters lacking identifiers are routed up front and excluded from all indices.
    let mut master_routed = vec![false; master_roster.len()];
    let mut master_claimed = vec![false; master_roster.len()];

    for (idx, master) in master_roster.iter().enumerate() {
        if !master.has_identifier() {
            master_routed[idx] = true;
            report.unidentifiable_master.push(master.clone());
            continue;
        }
        for part in master.primary_id_parts() {
            by_current_id.entry(part).or_insert(idx);
        }
        for part in master.legacy_id_parts() {
            by_legacy_id.entry(part).or_insert(idx);
        }
        let name_key = normalizer::normalize_alias_key(&master.display_name());
        if !name_key.is_empty() {
            by_display_name.entry(name_key).or_insert(idx);
        }
    }

    let mut next_seq = master_roster
        .iter()
        .filter_map(|m| m.seq)
        .max()
        .unwrap_or(master_roster.len() as i64);

    for incoming in new_roster {
        if !incoming.has_identifier() {
            report.unidentifiable_new.push(incoming.clone());
            continue;
        }

        let lookup_keys = incoming
            .primary_id_parts()
            .into_iter()
            .chain(incoming.legacy_id_parts());
        let mut hit: Option<(usize, MatchType)> = None;
        for key in lookup_keys {
            if let Some(&idx) = by_current_id.get(&key) {
                hit = Some((idx, MatchType::ByCurrentId));
                break;
            }
            if let Some(&idx) = by_legacy_id.get(&key) {
                hit = Some((idx, MatchType::ByLegacyId));
                break;
            }
        }

        match hit {
            Some((idx, _)) if master_claimed[idx] || master_routed[idx] => {
                // The master is already spoken for, either matched by an
                // earlier upload row or sitting in the conflict bucket.
                next_seq += 1;
                report.new_members.push(with_seq(incoming, next_seq));
            }
            Some((idx, match_type)) => {
                master_claimed[idx] = true;
                let master = &master_roster[idx];
                let deltas = diff_tracked_fields(master, incoming);
                if deltas.is_empty() {
                    report.matched.push(master.clone());
                } else {
                    report.changed.push(ChangedMember {
                        master: master.clone(),
                        incoming: incoming.clone(),
                        match_type,
                        deltas,
                    });
                }
            }
            None => {
                let name_key = normalizer::normalize_alias_key(&incoming.display_name());
                let name_hit = by_display_name
                    .get(&name_key)
                    .copied()
                    .filter(|&idx| !master_claimed[idx] && !master_routed[idx]);
                if let Some(idx) = name_hit {
                    master_routed[idx] = true;
                    report.conflicts.push(NameConflict {
                        display_name: incoming.display_name(),
                        master: master_roster[idx].clone(),
                        incoming: incoming.clone(),
                    });
                } else {
                    next_seq += 1;
                    report.new_members.push(with_seq(incoming, next_seq));
                }
            }
        }
    }

    for (idx, master) in master_roster.iter().enumerate() {
        if !master_routed[idx] && !master_claimed[idx] {
            report.absent_master.push(master.clone());
        }
    }

    report
}

fn with_seq(record: &MemberRecord, seq: i64) -> MemberRecord {
    let mut fresh = record.clone();
    fresh.seq = Some(seq);
    fresh
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
