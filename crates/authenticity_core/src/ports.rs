//! crates/authenticity_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the checker's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the storage engine, the classification API and the identity provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::ClassifierOutput;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for storage port operations.
/// This abstracts away the specific errors from external services (e.g., database, filesystem).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence
//=========================================================================================

/// Durable string-keyed storage. Whatever blob is written under a key is
/// returned unchanged on the next read.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

//=========================================================================================
// Classification
//=========================================================================================

/// Failure modes of a classification provider. "Not configured" is kept
/// apart from "call failed" so callers can tell a missing API key from an outage.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Classification provider is not configured")]
    NotConfigured,
    #[error("Classification call failed: {0}")]
    CallFailed(String),
}

#[async_trait]
pub trait ClassificationProvider: Send + Sync {
    /// Whether the provider has what it needs (e.g. credentials) to be called.
    fn is_configured(&self) -> bool;

    /// Classifies a piece of text as human, AI or mixed.
    async fn classify(&self, text: &str) -> Result<ClassifierOutput, ProviderError>;
}

//=========================================================================================
// Identity
//=========================================================================================

/// A signed-in account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
    /// Provider token used for follow-up calls on behalf of this user.
    #[serde(default, skip_serializing)]
    pub id_token: String,
}

/// Coded failures of the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    UserNotFound,
    WrongPassword,
    InvalidCredentials,
    EmailAlreadyInUse,
    WeakPassword,
    InvalidEmail,
    TooManyRequests,
    NetworkRequestFailed,
    NoActiveSession,
    Unknown(String),
}

impl AuthErrorCode {
    /// The fixed, human-readable message shown for this code.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::UserNotFound => "No account found with this email address.",
            Self::WrongPassword => "Incorrect password.",
            Self::InvalidCredentials => "Invalid email or password.",
            Self::EmailAlreadyInUse => "An account with this email already exists.",
            Self::WeakPassword => "Password should be at least 6 characters.",
            Self::InvalidEmail => "Please enter a valid email address.",
            Self::TooManyRequests => "Too many failed attempts. Please try again later.",
            Self::NetworkRequestFailed => "Network error. Please check your connection.",
            Self::NoActiveSession => "No user is signed in.",
            Self::Unknown(_) => "An error occurred. Please try again.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .code.user_message())]
pub struct AuthError {
    pub code: AuthErrorCode,
}

impl AuthError {
    pub fn new(code: AuthErrorCode) -> Self {
        Self { code }
    }
}

impl From<AuthErrorCode> for AuthError {
    fn from(code: AuthErrorCode) -> Self {
        Self::new(code)
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<IdentityUser>;

    /// Creates an account and returns it signed in. The display name is set as
    /// part of account creation.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> AuthResult<IdentityUser>;

    async fn sign_out(&self, user: &IdentityUser) -> AuthResult<()>;

    async fn send_password_reset(&self, email: &str) -> AuthResult<()>;

    async fn send_email_verification(&self, user: &IdentityUser) -> AuthResult<()>;

    /// Re-fetches the account, picking up changes such as a completed email verification.
    async fn reload(&self, user: &IdentityUser) -> AuthResult<IdentityUser>;
}
