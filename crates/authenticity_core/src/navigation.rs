//! crates/authenticity_core/src/navigation.rs
//!
//! Where the app must go for a given session state. Pure; hosts call
//! `redirect_for` after every session change and perform the navigation themselves.

use serde::Serialize;

use crate::auth::SessionState;

/// First path segment of every sign-in, sign-up and verification surface.
pub const AUTH_GROUP: &str = "auth";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    SignIn,
    VerifyEmail,
    Main,
}

impl Destination {
    pub fn path(self) -> &'static str {
        match self {
            Self::SignIn => "/auth/login",
            Self::VerifyEmail => "/auth/verify-email",
            Self::Main => "/",
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty())
}

pub fn in_auth_group(path: &str) -> bool {
    segments(path).next() == Some(AUTH_GROUP)
}

fn is_verify_surface(path: &str) -> bool {
    let mut parts = segments(path);
    parts.next() == Some(AUTH_GROUP) && parts.next() == Some("verify-email")
}

/// The destination to force for `session` while the app shows `current_path`,
/// or `None` when the current location is allowed.
pub fn redirect_for(session: &SessionState, current_path: &str) -> Option<Destination> {
    match session {
        SessionState::Unauthenticated if !in_auth_group(current_path) => Some(Destination::SignIn),
        SessionState::AuthenticatedUnverified(_)
            if !is_verify_surface(current_path) && !in_auth_group(current_path) =>
        {
            Some(Destination::VerifyEmail)
        }
        SessionState::AuthenticatedVerified(_) if in_auth_group(current_path) => {
            Some(Destination::Main)
        }
        _ => None,
    }
}
