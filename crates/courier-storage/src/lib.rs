//! Storage abstraction for courier.
//!
//! Backend crates (e.g., courier-store-postgres) implement the [`ContactStore`]
//! trait so the rest of the platform doesn't depend on any specific database
//! engine or schema details. Every operation is scoped to a workspace (tenant);
//! each workspace owns an isolated database reached through the external
//! workspace router.

use thiserror::Error;

pub mod cursor;
mod store;
mod types;

pub use cursor::Cursor;
pub use store::ContactStore;
pub use types::*;

#[cfg(feature = "test-support")]
pub use store::MockContactStore;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Workspace router or pool failure; wrapped and surfaced, never retried here.
    #[error("connection error: {0}")]
    Connection(String),
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("conflict")]
    Conflict,
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("{0} is not implemented")]
    Unimplemented(&'static str),
    /// A custom JSON slot whose value cannot be encoded or decoded.
    #[error("could not serialize {slot}: {reason}")]
    Serialization { slot: String, reason: String },
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguishable() {
        assert!(StoreError::NotFound.is_not_found());
        assert!(!StoreError::Backend("boom".into()).is_not_found());
        assert!(!StoreError::AlreadyExists.is_not_found());
    }

    #[test]
    fn serialization_error_names_the_slot() {
        let err = StoreError::Serialization {
            slot: "custom_json_3".into(),
            reason: "key must be a string".into(),
        };
        assert!(err.to_string().contains("custom_json_3"));
    }

    #[test]
    fn unimplemented_error_names_the_feature() {
        let err = StoreError::Unimplemented("segment targeting");
        assert_eq!(err.to_string(), "segment targeting is not implemented");
    }
}
