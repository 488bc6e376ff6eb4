pub mod database;
pub mod services;
pub mod types;
#[cfg(test)]
pub mod test_utils;

/// Default acceptance threshold for fuzzy name assignment. Shared across services.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.55;
