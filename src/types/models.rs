use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One known person in a roster.
///
/// Identity lives in `primary_id` / `legacy_id`; either may be a pipe-delimited
/// composite (`"A|B"`), in which case every part is an independent lookup key.
/// Records carrying neither identifier are still valid input — reconciliation
/// routes them to an "unidentifiable" bucket instead of guessing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub primary_id: Option<String>,
    pub legacy_id: Option<String>,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub other_names: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub residence: Option<String>,
    pub occupation: Option<String>,
    /// 1-indexed rank in the group's persisted order, when known.
    pub seq: Option<i64>,
    /// Spreadsheet columns this engine does not inspect, carried through untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl MemberRecord {
    /// Display name derived from the name parts, in ledger order.
    pub fn display_name(&self) -> String {
        [&self.first_name, &self.other_names, &self.surname]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Split a possibly composite ID (`"A|B"`) into trimmed, non-empty parts.
    pub fn split_id_parts(raw: Option<&str>) -> Vec<String> {
        raw.map(|value| {
            value
                .split('|')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
    }

    pub fn primary_id_parts(&self) -> Vec<String> {
        Self::split_id_parts(self.primary_id.as_deref())
    }

    pub fn legacy_id_parts(&self) -> Vec<String> {
        Self::split_id_parts(self.legacy_id.as_deref())
    }

    /// True when at least one usable identifier part exists.
    pub fn has_identifier(&self) -> bool {
        !self.primary_id_parts().is_empty() || !self.legacy_id_parts().is_empty()
    }
}

/// A raw observed name (OCR output or manual entry).
///
/// Ephemeral: lives only for the duration of one matching pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateName {
    pub text: String,
    /// 1-indexed row order in the source ledger, when the extractor knows it.
    pub position_hint: Option<i64>,
    /// Extraction confidence from the OCR step, if any. Informational only.
    pub confidence: Option<f64>,
}

impl CandidateName {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            position_hint: None,
            confidence: None,
        }
    }

    pub fn with_hint(text: impl Into<String>, position_hint: i64) -> Self {
        Self {
            text: text.into(),
            position_hint: Some(position_hint),
            confidence: None,
        }
    }
}

#[cfg(test)]
#[path = "tests/models_tests.rs"]
mod tests;
