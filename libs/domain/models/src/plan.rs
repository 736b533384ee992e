// [libs/domain/models/src/plan.rs]
use serde::{Deserialize, Serialize};

/// Plan de suscripción del usuario. Gobierna el gating de metering en
/// el Ledger de Energía.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Premium,
    Unlimited,
}

impl Plan {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Plan::Unlimited)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
            Plan::Unlimited => "unlimited",
        }
    }
}

impl Default for Plan {
    fn default() -> Self {
        Plan::Free
    }
}
