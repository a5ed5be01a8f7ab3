//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use authenticity_core::{AnalysisStore, AuthService, UserStore};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The host serves a single local user, so the stores are process-wide.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analysis: Arc<AnalysisStore>,
    pub profile: Arc<UserStore>,
    pub auth: Arc<AuthService>,
}
