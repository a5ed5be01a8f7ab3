//! crates/authenticity_core/src/auth.rs
//!
//! The Identity/Auth Boundary: owns the session lifecycle against the identity provider.
//!
//! Session changes are published on a `watch` channel; hosts subscribe and
//! re-run `navigation::redirect_for` on each change.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info};

use crate::navigation::{self, Destination};
use crate::ports::{AuthError, AuthErrorCode, AuthResult, IdentityProvider, IdentityUser};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "user", rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    AuthenticatedUnverified(IdentityUser),
    AuthenticatedVerified(IdentityUser),
}

impl SessionState {
    pub fn from_user(user: Option<IdentityUser>) -> Self {
        match user {
            None => Self::Unauthenticated,
            Some(u) if u.email_verified => Self::AuthenticatedVerified(u),
            Some(u) => Self::AuthenticatedUnverified(u),
        }
    }

    pub fn user(&self) -> Option<&IdentityUser> {
        match self {
            Self::Unauthenticated => None,
            Self::AuthenticatedUnverified(u) | Self::AuthenticatedVerified(u) => Some(u),
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::AuthenticatedVerified(_))
    }
}

#[derive(Debug, Default)]
struct AuthStatus {
    loading: bool,
    error: Option<String>,
}

pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    session: watch::Sender<SessionState>,
    status: RwLock<AuthStatus>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (session, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            provider,
            session,
            status: RwLock::new(AuthStatus::default()),
        }
    }

    pub fn session(&self) -> SessionState {
        self.session.borrow().clone()
    }

    /// A receiver that observes every session change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.status.read().unwrap_or_else(PoisonError::into_inner).loading
    }

    /// The message of the last failed operation, if it has not been cleared.
    pub fn error(&self) -> Option<String> {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .error
            .clone()
    }

    pub fn clear_error(&self) {
        self.status.write().unwrap_or_else(PoisonError::into_inner).error = None;
    }

    /// Navigation target for the current session while the app shows `current_path`.
    pub fn redirect_for(&self, current_path: &str) -> Option<Destination> {
        navigation::redirect_for(&self.session.borrow(), current_path)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<SessionState> {
        let user = self
            .run("sign in", self.provider.sign_in(email, password))
            .await?;
        info!(uid = %user.uid, verified = user.email_verified, "Sign in successful");
        Ok(self.set_user(Some(user)))
    }

    /// Creates an account, signs it in unverified and sends the verification email.
    ///
    /// When only the email send fails, the new session is kept and the error is returned.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> AuthResult<SessionState> {
        let user = self
            .run("sign up", self.provider.sign_up(email, password, display_name))
            .await?;
        let state = self.set_user(Some(user.clone()));
        self.run(
            "send verification email",
            self.provider.send_email_verification(&user),
        )
        .await?;
        info!(uid = %user.uid, "Sign up successful, verification email sent");
        Ok(state)
    }

    pub async fn sign_out(&self) -> AuthResult<()> {
        if let Some(user) = self.session().user().cloned() {
            self.run("sign out", self.provider.sign_out(&user)).await?;
        }
        self.set_user(None);
        info!("Sign out successful");
        Ok(())
    }

    pub async fn reset_password(&self, email: &str) -> AuthResult<()> {
        self.run("password reset", self.provider.send_password_reset(email))
            .await?;
        info!("Password reset email sent");
        Ok(())
    }

    pub async fn send_verification_email(&self) -> AuthResult<()> {
        let user = self.require_user()?;
        self.run(
            "send verification email",
            self.provider.send_email_verification(&user),
        )
        .await?;
        info!(uid = %user.uid, "Verification email sent");
        Ok(())
    }

    /// Re-fetches the signed-in account; a completed verification promotes the session.
    pub async fn reload(&self) -> AuthResult<SessionState> {
        let user = self.require_user()?;
        let refreshed = self.run("reload user", self.provider.reload(&user)).await?;
        Ok(self.set_user(Some(refreshed)))
    }

    /// Applies a session change pushed by the identity provider.
    pub fn session_changed(&self, user: Option<IdentityUser>) -> SessionState {
        self.set_user(user)
    }

    //=====================================================================================
    // Internals
    //=====================================================================================

    fn set_user(&self, user: Option<IdentityUser>) -> SessionState {
        let state = SessionState::from_user(user);
        info!(email = ?state.user().map(|u| u.email.as_str()), verified = state.is_verified(), "Auth state changed");
        self.session.send_replace(state.clone());
        state
    }

    fn require_user(&self) -> AuthResult<IdentityUser> {
        self.session().user().cloned().ok_or_else(|| {
            let err = AuthError::new(AuthErrorCode::NoActiveSession);
            self.record_error(&err);
            err
        })
    }

    fn record_error(&self, err: &AuthError) {
        self.status.write().unwrap_or_else(PoisonError::into_inner).error = Some(err.to_string());
    }

    fn set_loading(&self, loading: bool) {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        status.loading = loading;
        if loading {
            status.error = None;
        }
    }

    /// Runs one provider call with the loading flag raised, recording any failure.
    async fn run<T>(&self, op: &str, call: impl Future<Output = AuthResult<T>>) -> AuthResult<T> {
        self.set_loading(true);
        let outcome = call.await;
        self.set_loading(false);
        outcome.inspect_err(|e| {
            error!(op, code = ?e.code, "Identity provider call failed");
            self.record_error(e);
        })
    }
}
