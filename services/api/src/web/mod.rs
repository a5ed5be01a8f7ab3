pub mod auth;
pub mod middleware;
pub mod profile;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use middleware::require_verified;
pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the API router. Checker and profile routes sit behind the verified-session gate.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/signin", post(auth::signin_handler))
        .route("/auth/signout", post(auth::signout_handler))
        .route("/auth/reset-password", post(auth::reset_password_handler))
        .route("/auth/verification", post(auth::send_verification_handler))
        .route("/auth/reload", post(auth::reload_handler))
        .route("/auth/session", get(auth::session_handler))
        .route("/plans", get(rest::list_plans_handler))
        .route("/classifier/status", get(rest::classifier_status_handler));

    // Protected routes (verified session required)
    let protected_routes = Router::new()
        .route(
            "/analyses",
            get(rest::list_analyses_handler).post(rest::analyze_handler),
        )
        .route(
            "/analyses/current",
            get(rest::current_analysis_handler).delete(rest::clear_current_handler),
        )
        .route("/analyses/{id}", get(rest::get_analysis_handler))
        .route("/analyses/{id}/summary", get(rest::analysis_summary_handler))
        .route(
            "/profile",
            get(profile::get_profile_handler).patch(profile::update_profile_handler),
        )
        .route(
            "/profile/subscription",
            put(profile::update_subscription_handler),
        )
        .route(
            "/profile/checks/decrement",
            post(profile::decrement_checks_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_verified,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
