//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: sign-up, sign-in, sign-out, password reset,
//! email verification and the session/redirect query.
//!
//! Every response that changes the session carries the navigation target the
//! client should move to, computed from the path it reported via `?location=`.

use authenticity_core::{AuthError, AuthErrorCode, IdentityUser, SessionState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationQuery {
    /// The path the client is currently showing, e.g. `/auth/login` or `/history`.
    pub location: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// `unauthenticated`, `authenticated_unverified` or `authenticated_verified`.
    pub state: String,
    pub user: Option<SessionUser>,
    /// Where the client must navigate, if anywhere.
    pub redirect: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create an account and send the verification email
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    params(LocationQuery),
    responses(
        (status = 201, description = "Account created, verification email sent", body = SessionResponse),
        (status = 400, description = "Invalid email or weak password"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationQuery>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session = match state
        .auth
        .sign_up(&req.email, &req.password, &req.display_name)
        .await
    {
        Ok(session) => session,
        Err(e) => {
            // The account stays signed in when only the verification email failed.
            let current = state.auth.session();
            let created = current
                .user()
                .filter(|u| u.email.eq_ignore_ascii_case(&req.email));
            sync_profile(&state, created).await?;
            return Err(auth_failure(e));
        }
    };
    sync_profile(&state, session.user()).await?;
    Ok((
        StatusCode::CREATED,
        Json(session_response(&state, &session, &query)),
    ))
}

/// POST /auth/signin - Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/signin",
    request_body = SigninRequest,
    params(LocationQuery),
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Unknown account or wrong password"),
        (status = 429, description = "Too many attempts")
    )
)]
pub async fn signin_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationQuery>,
    Json(req): Json<SigninRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session = state
        .auth
        .sign_in(&req.email, &req.password)
        .await
        .map_err(auth_failure)?;
    sync_profile(&state, session.user()).await?;
    Ok(Json(session_response(&state, &session, &query)))
}

/// POST /auth/signout - End the session and drop the local profile
#[utoipa::path(
    post,
    path = "/auth/signout",
    params(LocationQuery),
    responses(
        (status = 200, description = "Signed out", body = SessionResponse)
    )
)]
pub async fn signout_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state.auth.sign_out().await.map_err(auth_failure)?;
    state.profile.logout().await.map_err(|e| {
        error!("Failed to clear the local profile: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to log out".to_string())
    })?;
    let session = state.auth.session();
    Ok(Json(session_response(&state, &session, &query)))
}

/// POST /auth/reset-password - Send a password reset email
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = PasswordResetRequest,
    responses(
        (status = 204, description = "Reset email sent"),
        (status = 401, description = "No account with this email")
    )
)]
pub async fn reset_password_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PasswordResetRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .auth
        .reset_password(&req.email)
        .await
        .map_err(auth_failure)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/verification - Re-send the verification email to the signed-in account
#[utoipa::path(
    post,
    path = "/auth/verification",
    responses(
        (status = 204, description = "Verification email sent"),
        (status = 401, description = "No user is signed in")
    )
)]
pub async fn send_verification_handler(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .auth
        .send_verification_email()
        .await
        .map_err(auth_failure)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/reload - Re-fetch the account to pick up a completed verification
#[utoipa::path(
    post,
    path = "/auth/reload",
    params(LocationQuery),
    responses(
        (status = 200, description = "Session refreshed", body = SessionResponse),
        (status = 401, description = "No user is signed in")
    )
)]
pub async fn reload_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session = state.auth.reload().await.map_err(auth_failure)?;
    if session.is_verified() {
        info!("Email verification confirmed");
    }
    sync_profile(&state, session.user()).await?;
    Ok(Json(session_response(&state, &session, &query)))
}

/// GET /auth/session - The current session and where the client should be
#[utoipa::path(
    get,
    path = "/auth/session",
    params(LocationQuery),
    responses(
        (status = 200, description = "Current session", body = SessionResponse)
    )
)]
pub async fn session_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationQuery>,
) -> Json<SessionResponse> {
    let session = state.auth.session();
    Json(session_response(&state, &session, &query))
}

//=========================================================================================
// Helpers
//=========================================================================================

fn session_response(
    state: &AppState,
    session: &SessionState,
    query: &LocationQuery,
) -> SessionResponse {
    let location = query.location.as_deref().unwrap_or("/");
    let label = match session {
        SessionState::Unauthenticated => "unauthenticated",
        SessionState::AuthenticatedUnverified(_) => "authenticated_unverified",
        SessionState::AuthenticatedVerified(_) => "authenticated_verified",
    };
    SessionResponse {
        state: label.to_string(),
        user: session.user().map(|u| SessionUser {
            uid: u.uid.clone(),
            email: u.email.clone(),
            display_name: u.display_name.clone(),
            email_verified: u.email_verified,
        }),
        redirect: authenticity_core::redirect_for(session, location)
            .map(|d| d.path().to_string()),
        is_loading: state.auth.is_loading(),
        error: state.auth.error(),
    }
}

/// Makes the local profile belong to `user`, loading or creating it when the
/// in-memory profile is missing or was set up for another account.
pub(crate) async fn sync_profile(
    state: &AppState,
    user: Option<&IdentityUser>,
) -> Result<(), (StatusCode, String)> {
    let Some(user) = user else {
        return Ok(());
    };
    let current = state
        .profile
        .profile()
        .is_some_and(|p| p.email.eq_ignore_ascii_case(&user.email));
    if current {
        return Ok(());
    }
    state.profile.login_identity(user).await.map_err(|e| {
        error!("Failed to establish the local profile: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Login failed. Please check your credentials.".to_string(),
        )
    })?;
    Ok(())
}

/// Maps an identity failure to a status code, keeping the user-facing message as the body.
pub fn auth_failure(err: AuthError) -> (StatusCode, String) {
    let status = match &err.code {
        AuthErrorCode::UserNotFound
        | AuthErrorCode::WrongPassword
        | AuthErrorCode::InvalidCredentials
        | AuthErrorCode::NoActiveSession => StatusCode::UNAUTHORIZED,
        AuthErrorCode::EmailAlreadyInUse => StatusCode::CONFLICT,
        AuthErrorCode::WeakPassword | AuthErrorCode::InvalidEmail => StatusCode::BAD_REQUEST,
        AuthErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        AuthErrorCode::NetworkRequestFailed => StatusCode::BAD_GATEWAY,
        AuthErrorCode::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}
