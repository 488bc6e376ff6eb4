pub mod alias_repo;
pub mod history_repo;
pub mod order_repo;
pub mod schema;

use chrono::{SecondsFormat, Utc};

/// Current timestamp as fixed-width RFC3339 (microseconds, Z suffix).
/// Bound explicitly instead of `CURRENT_TIMESTAMP` so recency comparisons
/// keep sub-second resolution.
pub(crate) fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
