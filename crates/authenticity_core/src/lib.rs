pub mod analysis_store;
pub mod auth;
mod blob;
pub mod domain;
pub mod error;
pub mod memory;
pub mod mock;
pub mod navigation;
pub mod normalize;
pub mod plans;
pub mod ports;
pub mod report;
pub mod seed;
pub mod user_store;

pub use analysis_store::{AnalysisSnapshot, AnalysisStore, HISTORY_KEY};
pub use auth::{AuthService, SessionState};
pub use domain::{
    AnalysisResult, AnalysisSource, ChecksRemaining, Classification, ClassifierOutput,
    ProfileUpdate, Subscription, SuspiciousSegment, UserProfile,
};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use mock::MockGenerator;
pub use navigation::{redirect_for, Destination};
pub use plans::{BillingPeriod, PlanId, SubscriptionPlan, PLANS};
pub use ports::{
    AuthError, AuthErrorCode, AuthResult, ClassificationProvider, IdentityProvider, IdentityUser,
    KeyValueStore, PortError, PortResult, ProviderError,
};
pub use user_store::{UserSnapshot, UserStore, USER_KEY};
