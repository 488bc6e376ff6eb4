pub mod errors;
pub mod models;

pub use errors::{RollbookError, RollbookResult};
pub use models::{CandidateName, MemberRecord};
