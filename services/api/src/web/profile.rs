//! services/api/src/web/profile.rs
//!
//! Profile and subscription endpoints.

use authenticity_core::{
    ChecksRemaining, PlanId, ProfileUpdate, StoreError, UserProfile, UserSnapshot,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::{rest::store_failure, state::AppState};

#[derive(Deserialize, ToSchema)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SubscriptionRequest {
    /// One of `free-trial`, `basic`, `premium`, `enterprise`.
    pub plan: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecksResponse {
    pub checks_remaining: Option<ChecksRemaining>,
}

#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "The local profile and its load state")
    )
)]
pub async fn get_profile_handler(State(state): State<Arc<AppState>>) -> Json<UserSnapshot> {
    Json(state.profile.snapshot())
}

/// Merge a name and/or email change into the profile.
#[utoipa::path(
    patch,
    path = "/profile",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 409, description = "No profile is loaded")
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<Json<UserProfile>, (StatusCode, String)> {
    let update = ProfileUpdate {
        name: req.name,
        email: req.email,
    };
    let profile = state
        .profile
        .update_profile(&update)
        .await
        .map_err(store_failure)?;
    Ok(Json(profile))
}

/// Switch plans. The subscription record is replaced wholesale.
#[utoipa::path(
    put,
    path = "/profile/subscription",
    request_body = SubscriptionRequest,
    responses(
        (status = 200, description = "Subscription replaced"),
        (status = 400, description = "Unknown plan"),
        (status = 409, description = "No profile is loaded")
    )
)]
pub async fn update_subscription_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubscriptionRequest>,
) -> Result<Json<UserProfile>, (StatusCode, String)> {
    let plan: PlanId = req
        .plan
        .parse()
        .map_err(|e| store_failure(StoreError::UnknownPlan(e)))?;
    let profile = state
        .profile
        .update_subscription(plan)
        .await
        .map_err(store_failure)?;
    Ok(Json(profile))
}

/// Consume one check. Unlimited and exhausted allowances are left unchanged.
#[utoipa::path(
    post,
    path = "/profile/checks/decrement",
    responses(
        (status = 200, description = "The allowance after the call")
    )
)]
pub async fn decrement_checks_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChecksResponse>, (StatusCode, String)> {
    let checks_remaining = state
        .profile
        .decrement_checks_remaining()
        .await
        .map_err(store_failure)?;
    Ok(Json(ChecksResponse { checks_remaining }))
}
