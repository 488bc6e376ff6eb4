//! Batch identity resolution: observed names → roster members.
//!
//! Pipeline per batch: alias fast path (previously confirmed handwriting
//! variants), then a similarity matrix over the still-unclaimed roster,
//! then the optimal-assignment pass with a confidence threshold. Pure —
//! persisting confirmed resolutions back into the alias store is the
//! caller's job.

use serde::Serialize;
use std::collections::HashMap;

#[cfg(feature = "debug_matcher")]
use log::debug;

use crate::types::{CandidateName, MemberRecord, RollbookResult};

use super::{assignment, normalizer, similarity};

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Minimum assignment score to accept a fuzzy match.
    pub score_threshold: f64,
    /// How many alternative suggestions to return for unmatched candidates.
    pub suggestion_limit: usize,
    /// Blend factor for the position-hint proximity bonus (0 disables it).
    pub position_weight: f64,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            score_threshold: crate::DEFAULT_MATCH_THRESHOLD,
            suggestion_limit: 3,
            position_weight: 0.05,
        }
    }
}

/// How a candidate was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// Exact hit on a previously confirmed alias.
    Alias,
    /// Accepted by the optimal-assignment pass.
    Assignment,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedMatch {
    pub candidate_index: usize,
    pub roster_index: usize,
    pub member_id: Option<String>,
    pub score: f64,
    pub source: MatchSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub roster_index: usize,
    pub display_name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedCandidate {
    pub candidate_index: usize,
    pub text: String,
    /// Top alternatives by raw similarity, for manual resolution.
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Default, Serialize)]
pub struct ResolveOutcome {
    pub matched: Vec<ResolvedMatch>,
    pub unmatched: Vec<UnmatchedCandidate>,
}

/// Resolve a batch of candidate names against a roster.
///
/// `aliases` maps normalized candidate text → member `primary_id` for the
/// same group (pass an empty map when none are known). Each roster entry is
/// claimed at most once across both passes.
pub fn resolve(
    candidates: &[CandidateName],
    roster: &[MemberRecord],
    aliases: &HashMap<String, String>,
    options: &ResolveOptions,
) -> RollbookResult<ResolveOutcome> {
    let mut outcome = ResolveOutcome::default();
    let mut roster_claimed = vec![false; roster.len()];

    let roster_by_id: HashMap<&str, usize> = roster
        .iter()
        .enumerate()
        .filter_map(|(idx, member)| member.primary_id.as_deref().map(|id| (id, idx)))
        .collect();

    // Pass 1: alias fast path. Zero-cost, maximal confidence.
    let mut pending: Vec<usize> = Vec::new();
    for (candidate_index, candidate) in candidates.iter().enumerate() {
        let key = normalizer::normalize_alias_key(&candidate.text);
        let hit = aliases
            .get(&key)
            .and_then(|member_id| roster_by_id.get(member_id.as_str()).copied())
            .filter(|&roster_index| !roster_claimed[roster_index]);

        match hit {
            Some(roster_index) => {
                roster_claimed[roster_index] = true;
                outcome.matched.push(ResolvedMatch {
                    candidate_index,
                    roster_index,
                    member_id: roster[roster_index].primary_id.clone(),
                    score: 1.0,
                    source: MatchSource::Alias,
                });
            }
            None => pending.push(candidate_index),
        }
    }

    if pending.is_empty() {
        return Ok(outcome);
    }

    let free_roster: Vec<usize> = (0..roster.len())
        .filter(|&idx| !roster_claimed[idx])
        .collect();

    if free_roster.is_empty() {
        for candidate_index in pending {
            outcome.unmatched.push(UnmatchedCandidate {
                candidate_index,
                text: candidates[candidate_index].text.clone(),
                suggestions: Vec::new(),
            });
        }
        return Ok(outcome);
    }

    // Pass 2: similarity matrix + optimal assignment over what remains.
    let mut matrix: Vec<Vec<f64>> = Vec::with_capacity(pending.len());
    let mut raw_scores: Vec<Vec<f64>> = Vec::with_capacity(pending.len());
    for &candidate_index in &pending {
        let candidate = &candidates[candidate_index];
        let mut cells = Vec::with_capacity(free_roster.len());
        let mut raw = Vec::with_capacity(free_roster.len());
        for &roster_index in &free_roster {
            let member = &roster[roster_index];
            let score = similarity::similarity(&candidate.text, &member.display_name());
            raw.push(score);
            cells.push(blend_position_hint(
                score,
                candidate.position_hint,
                member.seq,
                options.position_weight,
            ));
        }
        matrix.push(cells);
        raw_scores.push(raw);
    }

    let assigned = assignment::solve(&matrix)?;

    for (pending_idx, &candidate_index) in pending.iter().enumerate() {
        let accepted = assigned[pending_idx]
            .filter(|&col| matrix[pending_idx][col] >= options.score_threshold);

        match accepted {
            Some(col) => {
                let roster_index = free_roster[col];
                outcome.matched.push(ResolvedMatch {
                    candidate_index,
                    roster_index,
                    member_id: roster[roster_index].primary_id.clone(),
                    score: matrix[pending_idx][col],
                    source: MatchSource::Assignment,
                });
            }
            None => {
                #[cfg(feature = "debug_matcher")]
                if let Some(col) = assigned[pending_idx] {
                    debug!(
                        "[MATCHER_CALIBRATION] resolve: threshold_not_met | text={:?} best_score={:.2} threshold={:.2}",
                        candidates[candidate_index].text,
                        matrix[pending_idx][col],
                        options.score_threshold
                    );
                }
                outcome.unmatched.push(UnmatchedCandidate {
                    candidate_index,
                    text: candidates[candidate_index].text.clone(),
                    suggestions: top_suggestions(
                        &raw_scores[pending_idx],
                        &free_roster,
                        roster,
                        options.suggestion_limit,
                    ),
                });
            }
        }
    }

    outcome.matched.sort_by_key(|m| m.candidate_index);
    Ok(outcome)
}

/// Blend the similarity score with position-hint proximity when both the
/// candidate's ledger row and the member's stored rank are known. The bonus
/// is a secondary tie-break: it reorders near-equal scores without lifting
/// an unrelated name over the threshold, and keeps cells inside [0, 1].
fn blend_position_hint(
    score: f64,
    position_hint: Option<i64>,
    member_seq: Option<i64>,
    position_weight: f64,
) -> f64 {
    if score <= 0.0 || position_weight <= 0.0 {
        return score;
    }
    match (position_hint, member_seq) {
        (Some(hint), Some(seq)) => {
            let distance = (hint - seq).unsigned_abs() as f64;
            let proximity = 1.0 / (1.0 + distance);
            score * (1.0 - position_weight) + position_weight * proximity
        }
        _ => score,
    }
}

fn top_suggestions(
    raw_scores: &[f64],
    free_roster: &[usize],
    roster: &[MemberRecord],
    limit: usize,
) -> Vec<Suggestion> {
    let mut ranked: Vec<(usize, f64)> = raw_scores
        .iter()
        .enumerate()
        .filter(|(_, &score)| score > 0.0)
        .map(|(col, &score)| (col, score))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
        .into_iter()
        .take(limit)
        .map(|(col, score)| {
            let roster_index = free_roster[col];
            Suggestion {
                roster_index,
                display_name: roster[roster_index].display_name(),
                score,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
