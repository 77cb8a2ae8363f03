pub mod capture;
pub mod error;
pub mod filter;
pub mod metadata;
pub mod models;
pub mod repository;
pub mod session;
pub mod tracking;
pub mod utils;

pub use error::*;
pub use models::*;
pub use session::{AuditOutcome, AuditingSession, SaveOutcome};

#[cfg(test)]
pub mod test_utils;
