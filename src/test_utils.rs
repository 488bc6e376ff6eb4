//! Shared helpers for async database tests.

use sqlx::SqlitePool;
use std::sync::Once;

use crate::database::schema;
use crate::types::MemberRecord;

static INIT: Once = Once::new();

/// Fully-schemed in-memory pool.
pub async fn memory_pool() -> SqlitePool {
    INIT.call_once(|| {
        // Initialize logger only once
        let _ = env_logger::builder().is_test(true).try_init();
    });
    schema::open_memory_pool().await.expect("in-memory pool")
}

/// Minimal member with a primary id and a two-part name.
pub fn member(id: &str, first: &str, surname: &str) -> MemberRecord {
    MemberRecord {
        primary_id: Some(id.to_string()),
        first_name: Some(first.to_string()),
        surname: Some(surname.to_string()),
        ..Default::default()
    }
}

/// (member_id, display_name) pairs in the shape the order repo seeds from.
pub fn order_records(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(id, name)| (id.to_string(), name.to_string()))
        .collect()
}
