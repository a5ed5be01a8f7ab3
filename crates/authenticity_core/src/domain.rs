//! crates/authenticity_core/src/domain.rs
//!
//! Defines the core data structures for the checker: analysis results, the
//! user profile and its subscription record.
//! These structs are independent of any storage engine. They serialize to the
//! camelCase JSON blobs that the key-value store holds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plans::PlanId;

/// Title given to an analysis when the caller does not supply one.
pub const UNTITLED_DOCUMENT: &str = "Untitled Document";

//=========================================================================================
// Analysis Results
//=========================================================================================

/// The verdict of a single check. Closed set; nothing else may be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Human,
    Ai,
    Mixed,
}

impl Classification {
    pub const ALL: [Classification; 3] = [Self::Human, Self::Ai, Self::Mixed];

    /// Label used in reports and result screens.
    pub fn display_label(self) -> &'static str {
        match self {
            Self::Human => "Human Written",
            Self::Ai => "AI Generated",
            Self::Mixed => "Mixed Content",
        }
    }

    /// Compact label used in history lists.
    pub fn short_label(self) -> &'static str {
        match self {
            Self::Human => "Human",
            Self::Ai => "AI",
            Self::Mixed => "Mixed",
        }
    }
}

/// Where the numbers in an `AnalysisResult` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    /// The configured classification provider answered.
    #[default]
    Provider,
    /// No provider was configured; the mock generator produced the result.
    FallbackNotConfigured,
    /// The provider was configured but the call failed; the mock generator stood in.
    FallbackAfterError,
    /// Part of the demo history seeded on first start.
    Demo,
}

impl AnalysisSource {
    pub fn is_fallback(self) -> bool {
        matches!(self, Self::FallbackNotConfigured | Self::FallbackAfterError)
    }
}

/// A span of the input the provider considers suspicious.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspiciousSegment {
    pub text: String,
    pub start_index: usize,
    pub end_index: usize,
    /// Probability in `[0, 1]` that the span is machine-written.
    pub score: f64,
}

/// One completed check. Immutable once it has been added to the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub classification: Classification,
    /// Percentage in `[0, 100]`.
    pub confidence_score: f64,
    /// Character count of the analyzed text.
    pub text_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub suspicious_segments: Vec<SuspiciousSegment>,
    #[serde(default)]
    pub source: AnalysisSource,
}

/// The raw answer of a classification provider (or the mock generator),
/// before normalization into an `AnalysisResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierOutput {
    pub classification: Classification,
    pub confidence_score: f64,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub suspicious_segments: Vec<SuspiciousSegment>,
}

//=========================================================================================
// User Profile & Subscription
//=========================================================================================

/// How many checks the user has left in the current period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "ChecksRepr")]
pub enum ChecksRemaining {
    Unlimited,
    Remaining(u32),
}

impl ChecksRemaining {
    pub fn is_unlimited(self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// The value after one check has been consumed. Unlimited and exhausted
    /// allowances are left as they are.
    pub fn decremented(self) -> Self {
        match self {
            Self::Remaining(n) if n > 0 => Self::Remaining(n - 1),
            other => other,
        }
    }
}

impl std::fmt::Display for ChecksRemaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlimited => f.write_str("Unlimited"),
            Self::Remaining(n) => write!(f, "{n}"),
        }
    }
}

/// The bare integer older builds wrote for an unlimited subscription.
const LEGACY_UNLIMITED: i64 = 999_999;

/// Accepted on-disk shapes: the tagged form, or the legacy bare integer where
/// a negative value or `999999` meant "unlimited".
#[derive(Deserialize)]
#[serde(untagged)]
enum ChecksRepr {
    Tagged(TaggedChecks),
    Legacy(i64),
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaggedChecks {
    Unlimited,
    Remaining(u32),
}

impl TryFrom<ChecksRepr> for ChecksRemaining {
    type Error = String;

    fn try_from(repr: ChecksRepr) -> Result<Self, Self::Error> {
        match repr {
            ChecksRepr::Tagged(TaggedChecks::Unlimited) => Ok(Self::Unlimited),
            ChecksRepr::Tagged(TaggedChecks::Remaining(n)) => Ok(Self::Remaining(n)),
            ChecksRepr::Legacy(n) if n < 0 || n == LEGACY_UNLIMITED => Ok(Self::Unlimited),
            ChecksRepr::Legacy(n) => u32::try_from(n)
                .map(Self::Remaining)
                .map_err(|_| format!("checks remaining out of range: {n}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub plan: PlanId,
    pub expires_at: DateTime<Utc>,
    pub checks_remaining: ChecksRemaining,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subscription: Subscription,
}

/// Partial update merged into the active profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ProfileUpdate {
    pub fn apply_to(&self, profile: &UserProfile) -> UserProfile {
        let mut updated = profile.clone();
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(email) = &self.email {
            updated.email = email.clone();
        }
        updated
    }
}
