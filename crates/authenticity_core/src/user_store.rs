//! crates/authenticity_core/src/user_store.rs
//!
//! The User/Subscription Store: one profile per session and the subscription
//! transitions applied to it. Every mutation is persisted before it becomes visible.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Duration, Months, Utc};
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::blob;
use crate::domain::{ChecksRemaining, ProfileUpdate, Subscription, UserProfile};
use crate::error::{StoreError, StoreResult};
use crate::plans::PlanId;
use crate::ports::{IdentityUser, KeyValueStore};
use crate::seed::demo_profile;

/// Storage key of the serialized profile.
pub const USER_KEY: &str = "user";

#[derive(Debug, Default)]
struct UserState {
    profile: Option<UserProfile>,
    is_loading: bool,
    error: Option<String>,
    loaded: bool,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub profile: Option<UserProfile>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub struct UserStore {
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<UserState>,
    writes: Mutex<()>,
}

impl UserStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            state: RwLock::new(UserState::default()),
            writes: Mutex::new(()),
        }
    }

    /// Loads the stored profile, seeding and persisting the demo profile when none exists.
    pub async fn initialize(&self) -> StoreResult<()> {
        let _write = self.writes.lock().await;
        if self.state().loaded {
            return Ok(());
        }

        self.state_mut().is_loading = true;
        let outcome = self.load_or_seed().await;
        let mut state = self.state_mut();
        state.is_loading = false;
        if outcome.is_err() {
            state.error = Some("Failed to load user data".to_string());
        }
        outcome
    }

    /// Establishes the local profile for an already-authenticated user.
    ///
    /// Credentials are verified by the identity provider, not here. A stored
    /// profile for the same email is kept; otherwise a fresh free-trial
    /// profile is created.
    pub async fn login(&self, email: &str, _password: &str) -> StoreResult<UserProfile> {
        self.establish(None, None, email).await
    }

    /// Like `login`, but takes identity fields from the provider's account.
    pub async fn login_identity(&self, user: &IdentityUser) -> StoreResult<UserProfile> {
        self.establish(Some(&user.uid), user.display_name.as_deref(), &user.email)
            .await
    }

    /// Clears the stored profile and the in-memory one.
    pub async fn logout(&self) -> StoreResult<()> {
        let _write = self.writes.lock().await;
        if let Err(e) = self.storage.remove(USER_KEY).await {
            error!(error = %e, "Logout failed");
            self.state_mut().error = Some("Failed to log out".to_string());
            return Err(StoreError::Persistence(e));
        }
        let mut state = self.state_mut();
        state.profile = None;
        state.loaded = true;
        state.error = None;
        info!("Logged out, local profile cleared");
        Ok(())
    }

    /// Merges `update` into the active profile.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> StoreResult<UserProfile> {
        let _write = self.writes.lock().await;
        let current = self.require_profile()?;
        let updated = update.apply_to(&current);
        self.commit(updated, "Failed to update profile").await
    }

    /// Replaces the subscription with a fresh one-month period on `plan`.
    pub async fn update_subscription(&self, plan: PlanId) -> StoreResult<UserProfile> {
        let _write = self.writes.lock().await;
        let current = self.require_profile()?;

        let now = Utc::now();
        let expires_at = now
            .checked_add_months(Months::new(1))
            .unwrap_or_else(|| now + Duration::days(30));

        let updated = UserProfile {
            subscription: Subscription {
                plan,
                expires_at,
                checks_remaining: plan.allowance(),
            },
            ..current
        };
        let profile = self
            .commit(updated, "Failed to update subscription")
            .await?;
        info!(plan = %plan, checks = %profile.subscription.checks_remaining, "Subscription updated");
        Ok(profile)
    }

    /// Consumes one check. Does nothing without a profile, on unlimited plans,
    /// or once the allowance is exhausted.
    pub async fn decrement_checks_remaining(&self) -> StoreResult<Option<ChecksRemaining>> {
        let _write = self.writes.lock().await;
        let Some(current) = self.profile() else {
            return Ok(None);
        };

        let before = current.subscription.checks_remaining;
        let after = before.decremented();
        if after == before {
            return Ok(Some(before));
        }

        let mut updated = current;
        updated.subscription.checks_remaining = after;
        self.commit(updated, "Failed to update checks remaining")
            .await
            .map(|p| Some(p.subscription.checks_remaining))
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.state().profile.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().profile.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn snapshot(&self) -> UserSnapshot {
        let state = self.state();
        UserSnapshot {
            profile: state.profile.clone(),
            is_authenticated: state.profile.is_some(),
            is_loading: state.is_loading,
            error: state.error.clone(),
        }
    }

    //=====================================================================================
    // Internals
    //=====================================================================================

    async fn load_or_seed(&self) -> StoreResult<()> {
        let stored = blob::load::<UserProfile>(self.storage.as_ref(), USER_KEY)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to initialize user"))?;

        let profile = match stored {
            Some(profile) => profile,
            None => {
                let seed = demo_profile();
                info!(user = %seed.id, "No stored profile, seeding demo profile");
                self.state_mut().profile = Some(seed.clone());
                blob::save(self.storage.as_ref(), USER_KEY, &seed)
                    .await
                    .inspect_err(|e| error!(error = %e, "Failed to persist seeded profile"))?;
                seed
            }
        };

        let mut state = self.state_mut();
        state.profile = Some(profile);
        state.loaded = true;
        Ok(())
    }

    async fn establish(
        &self,
        id: Option<&str>,
        name: Option<&str>,
        email: &str,
    ) -> StoreResult<UserProfile> {
        let _write = self.writes.lock().await;
        self.state_mut().is_loading = true;

        let outcome = self.resolve_and_save(id, name, email).await;
        let mut state = self.state_mut();
        state.is_loading = false;
        match outcome {
            Ok(profile) => {
                info!(user = %profile.id, "Local profile established");
                state.profile = Some(profile.clone());
                state.loaded = true;
                state.error = None;
                Ok(profile)
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                state.error = Some("Login failed. Please check your credentials.".to_string());
                Err(match e {
                    StoreError::Persistence(port) => StoreError::Login(port),
                    other => other,
                })
            }
        }
    }

    /// Picks the stored profile for `email`, or a new one, and persists it.
    /// Must be called with `writes` held.
    async fn resolve_and_save(
        &self,
        id: Option<&str>,
        name: Option<&str>,
        email: &str,
    ) -> StoreResult<UserProfile> {
        // An unreadable blob aborts the login rather than being replaced.
        if !self.state().loaded {
            let stored = blob::load::<UserProfile>(self.storage.as_ref(), USER_KEY).await?;
            let mut state = self.state_mut();
            state.profile = stored;
            state.loaded = true;
        }

        let existing = self
            .profile()
            .filter(|p| p.email.eq_ignore_ascii_case(email));
        let profile = match existing {
            Some(profile) => profile,
            None => new_profile(id, name, email),
        };
        blob::save(self.storage.as_ref(), USER_KEY, &profile).await?;
        Ok(profile)
    }

    fn require_profile(&self) -> StoreResult<UserProfile> {
        self.profile().ok_or_else(|| {
            self.state_mut().error = Some(StoreError::NoActiveProfile.to_string());
            StoreError::NoActiveProfile
        })
    }

    /// Persists `profile`, then makes it the in-memory profile. Must be called with `writes` held.
    async fn commit(&self, profile: UserProfile, failure: &str) -> StoreResult<UserProfile> {
        if let Err(e) = blob::save(self.storage.as_ref(), USER_KEY, &profile).await {
            error!(error = %e, "{failure}");
            self.state_mut().error = Some(failure.to_string());
            return Err(e);
        }
        let mut state = self.state_mut();
        state.profile = Some(profile.clone());
        state.error = None;
        Ok(profile)
    }

    fn state(&self) -> RwLockReadGuard<'_, UserState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, UserState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn new_profile(id: Option<&str>, name: Option<&str>, email: &str) -> UserProfile {
    let fallback_name = email.split('@').next().unwrap_or(email);
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(fallback_name);

    let plan = PlanId::FreeTrial;
    let now = Utc::now();
    UserProfile {
        id: id.map(str::to_string).unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: name.to_string(),
        email: email.to_string(),
        subscription: Subscription {
            plan,
            expires_at: now + Duration::days(7),
            checks_remaining: plan.allowance(),
        },
    }
}
