//! services/api/src/web/middleware.rs
//!
//! Session gate for the checker routes.

use authenticity_core::SessionState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::web::{auth::sync_profile, state::AppState};

/// Lets the request through only for a signed-in, verified account.
///
/// Unauthenticated sessions get 401; signed-in but unverified ones get 403.
/// A verified session that changed outside the auth endpoints gets its local
/// profile set up before the request runs.
pub async fn require_verified(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    match state.auth.session() {
        SessionState::AuthenticatedVerified(user) => {
            sync_profile(&state, Some(&user))
                .await
                .map_err(|(status, _)| status)?;
            Ok(next.run(req).await)
        }
        SessionState::AuthenticatedUnverified(user) => {
            debug!(uid = %user.uid, path = %req.uri().path(), "Rejected unverified session");
            Err(StatusCode::FORBIDDEN)
        }
        SessionState::Unauthenticated => Err(StatusCode::UNAUTHORIZED),
    }
}
