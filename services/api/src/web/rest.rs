//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the analysis and catalog endpoints and the
//! master definition for the OpenAPI specification.

use crate::web::{auth, profile, state::AppState};
use authenticity_core::{
    report, AnalysisResult, AnalysisSnapshot, ChecksRemaining, StoreError, SubscriptionPlan, PLANS,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_analyses_handler,
        analyze_handler,
        current_analysis_handler,
        clear_current_handler,
        get_analysis_handler,
        analysis_summary_handler,
        list_plans_handler,
        classifier_status_handler,
        auth::signup_handler,
        auth::signin_handler,
        auth::signout_handler,
        auth::reset_password_handler,
        auth::send_verification_handler,
        auth::reload_handler,
        auth::session_handler,
        profile::get_profile_handler,
        profile::update_profile_handler,
        profile::update_subscription_handler,
        profile::decrement_checks_handler,
    ),
    components(
        schemas(
            AnalyzeRequest,
            ClassifierStatus,
            auth::SignupRequest,
            auth::SigninRequest,
            auth::PasswordResetRequest,
            auth::SessionUser,
            auth::SessionResponse,
            profile::ProfileUpdateRequest,
            profile::SubscriptionRequest,
        )
    ),
    tags(
        (name = "AI-Check API", description = "Endpoints for checking whether a text was written by a human or generated by AI.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    pub text: String,
    /// Defaults to "Untitled Document" when absent or blank.
    pub title: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub result: AnalysisResult,
    /// The allowance left after this check, when a profile is loaded.
    pub checks_remaining: Option<ChecksRemaining>,
}

/// A stored result together with the figures the result screen shows.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisView {
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub classification_label: &'static str,
    /// Compact label for history lists.
    pub short_label: &'static str,
    pub estimated_words: usize,
    /// True when the mock generator produced the numbers.
    pub used_fallback: bool,
}

impl From<AnalysisResult> for AnalysisView {
    fn from(result: AnalysisResult) -> Self {
        Self {
            classification_label: result.classification.display_label(),
            short_label: result.classification.short_label(),
            estimated_words: report::estimated_words(result.text_length),
            used_fallback: result.source.is_fallback(),
            result,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ClassifierStatus {
    /// False when no API key is set and every check uses the mock generator.
    pub configured: bool,
    pub model: String,
}

//=========================================================================================
// Analysis Handlers
//=========================================================================================

/// The analysis history (newest first), the current result and the in-progress flag.
#[utoipa::path(
    get,
    path = "/analyses",
    responses(
        (status = 200, description = "History snapshot"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Email not verified")
    )
)]
pub async fn list_analyses_handler(State(state): State<Arc<AppState>>) -> Json<AnalysisSnapshot> {
    Json(state.analysis.snapshot())
}

/// Analyze a piece of text and add the result to the history.
///
/// A successful check consumes one of the profile's remaining checks.
#[utoipa::path(
    post,
    path = "/analyses",
    request_body = AnalyzeRequest,
    responses(
        (status = 201, description = "Analysis completed"),
        (status = 400, description = "Empty text"),
        (status = 500, description = "The history could not be saved")
    )
)]
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let result = state
        .analysis
        .analyze_text(&req.text, req.title.as_deref())
        .await
        .map_err(store_failure)?;

    let checks_remaining = match state.profile.decrement_checks_remaining().await {
        Ok(remaining) => remaining,
        Err(e) => {
            warn!("Failed to record the used check: {:?}", e);
            state.profile.profile().map(|p| p.subscription.checks_remaining)
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(AnalyzeResponse {
            result,
            checks_remaining,
        }),
    ))
}

/// The result of the most recent check, if it has not been dismissed.
#[utoipa::path(
    get,
    path = "/analyses/current",
    responses(
        (status = 200, description = "Current result"),
        (status = 404, description = "No current result")
    )
)]
pub async fn current_analysis_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalysisView>, (StatusCode, String)> {
    state
        .analysis
        .current()
        .map(|r| Json(r.into()))
        .ok_or_else(|| (StatusCode::NOT_FOUND, "No current analysis".to_string()))
}

/// Dismiss the current result. History is unaffected.
#[utoipa::path(
    delete,
    path = "/analyses/current",
    responses(
        (status = 204, description = "Current result cleared")
    )
)]
pub async fn clear_current_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    state.analysis.clear_current();
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    get,
    path = "/analyses/{id}",
    params(("id" = String, Path, description = "The analysis id")),
    responses(
        (status = 200, description = "The stored result"),
        (status = 404, description = "No analysis with this id")
    )
)]
pub async fn get_analysis_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisView>, (StatusCode, String)> {
    state
        .analysis
        .get_by_id(&id)
        .map(|r| Json(r.into()))
        .ok_or_else(|| not_found(&id))
}

/// The plain-text summary offered by the share action.
#[utoipa::path(
    get,
    path = "/analyses/{id}/summary",
    params(("id" = String, Path, description = "The analysis id")),
    responses(
        (status = 200, description = "Shareable summary", body = String, content_type = "text/plain"),
        (status = 404, description = "No analysis with this id")
    )
)]
pub async fn analysis_summary_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<String, (StatusCode, String)> {
    state
        .analysis
        .get_by_id(&id)
        .map(|r| report::share_summary(&r))
        .ok_or_else(|| not_found(&id))
}

//=========================================================================================
// Catalog Handlers
//=========================================================================================

/// The subscription plans on offer.
#[utoipa::path(
    get,
    path = "/plans",
    responses(
        (status = 200, description = "Plan catalog")
    )
)]
pub async fn list_plans_handler() -> Json<&'static [SubscriptionPlan]> {
    Json(PLANS.as_slice())
}

#[utoipa::path(
    get,
    path = "/classifier/status",
    responses(
        (status = 200, description = "Whether checks go to the configured classifier", body = ClassifierStatus)
    )
)]
pub async fn classifier_status_handler(State(state): State<Arc<AppState>>) -> Json<ClassifierStatus> {
    Json(ClassifierStatus {
        configured: state.analysis.provider_configured(),
        model: state.config.classifier_model.clone(),
    })
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn not_found(id: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("No analysis with id '{id}'"))
}

/// Maps a store failure to a response. Input errors carry their message; storage
/// failures are logged and reported generically.
pub fn store_failure(err: StoreError) -> (StatusCode, String) {
    match err {
        StoreError::EmptyInput | StoreError::UnknownPlan(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        StoreError::NoActiveProfile => (StatusCode::CONFLICT, err.to_string()),
        StoreError::Login(_) | StoreError::Persistence(_) | StoreError::Corrupt { .. } => {
            error!("Store operation failed: {:?}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save your data. Please try again.".to_string(),
            )
        }
    }
}
