//! crates/authenticity_core/src/error.rs
//!
//! Errors returned by the analysis and user stores.

use crate::plans::UnknownPlan;
use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The text submitted for analysis was empty or whitespace-only.
    #[error("Please enter some text to analyze.")]
    EmptyInput,

    #[error("No user profile is loaded")]
    NoActiveProfile,

    #[error("Login failed: {0}")]
    Login(#[source] PortError),

    /// Reading or writing the key-value store failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PortError),

    /// A stored blob could not be decoded or encoded.
    #[error("Stored data under '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    UnknownPlan(#[from] UnknownPlan),
}

pub type StoreResult<T> = Result<T, StoreError>;
