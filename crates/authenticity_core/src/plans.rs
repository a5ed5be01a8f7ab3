//! crates/authenticity_core/src/plans.rs
//!
//! The static subscription catalog. Plan entitlements are looked up here, never derived.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::ChecksRemaining;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanId {
    FreeTrial,
    Basic,
    Premium,
    Enterprise,
}

impl PlanId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FreeTrial => "free-trial",
            Self::Basic => "basic",
            Self::Premium => "premium",
            Self::Enterprise => "enterprise",
        }
    }

    /// Checks granted for one billing period on this plan.
    pub fn allowance(self) -> ChecksRemaining {
        plan(self).allowance
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown subscription plan: {0}")]
pub struct UnknownPlan(pub String);

impl FromStr for PlanId {
    type Err = UnknownPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "free-trial" => Ok(Self::FreeTrial),
            "basic" => Ok(Self::Basic),
            "premium" => Ok(Self::Premium),
            "enterprise" => Ok(Self::Enterprise),
            other => Err(UnknownPlan(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: PlanId,
    pub name: &'static str,
    pub monthly_price_cents: u32,
    pub yearly_price_cents: Option<u32>,
    pub features: &'static [&'static str],
    pub allowance: ChecksRemaining,
    pub featured: bool,
}

impl SubscriptionPlan {
    /// Price in cents for the given period, or `None` when the plan is not
    /// sold on that period.
    pub fn price_for(&self, period: BillingPeriod) -> Option<u32> {
        match period {
            BillingPeriod::Monthly => Some(self.monthly_price_cents),
            BillingPeriod::Yearly => self.yearly_price_cents,
        }
    }

    pub fn is_free(&self) -> bool {
        self.monthly_price_cents == 0 && self.yearly_price_cents.is_none()
    }
}

pub static PLANS: [SubscriptionPlan; 4] = [
    SubscriptionPlan {
        id: PlanId::FreeTrial,
        name: "Free Trial",
        monthly_price_cents: 0,
        yearly_price_cents: None,
        features: &[
            "7-day access",
            "5 document checks",
            "Basic report format",
            "Text input only",
        ],
        allowance: ChecksRemaining::Remaining(5),
        featured: false,
    },
    SubscriptionPlan {
        id: PlanId::Basic,
        name: "Basic Plan",
        monthly_price_cents: 1499,
        yearly_price_cents: Some(14999),
        features: &[
            "50 document checks/month",
            "Detailed reports",
            "Text & file support",
            "Download reports",
        ],
        allowance: ChecksRemaining::Remaining(50),
        featured: true,
    },
    SubscriptionPlan {
        id: PlanId::Premium,
        name: "Premium Plan",
        monthly_price_cents: 2999,
        yearly_price_cents: Some(29999),
        features: &[
            "200 checks/month",
            "Priority processing",
            "Advanced analytics",
            "Highlighted suspicious sections",
        ],
        allowance: ChecksRemaining::Remaining(200),
        featured: false,
    },
    SubscriptionPlan {
        id: PlanId::Enterprise,
        name: "Enterprise Plan",
        monthly_price_cents: 0,
        yearly_price_cents: None,
        features: &[
            "Unlimited checks",
            "API access",
            "Team dashboard",
            "Dedicated support",
        ],
        allowance: ChecksRemaining::Unlimited,
        featured: false,
    },
];

/// Looks up the catalog entry for a plan.
pub fn plan(id: PlanId) -> &'static SubscriptionPlan {
    match id {
        PlanId::FreeTrial => &PLANS[0],
        PlanId::Basic => &PLANS[1],
        PlanId::Premium => &PLANS[2],
        PlanId::Enterprise => &PLANS[3],
    }
}
