//! User credit balance.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Subscription tier that bypasses the credit balance check.
pub const ENTERPRISE_TIER: &str = "enterprise";

/// Consumable credit balance attached to a user profile.
///
/// `credits_remaining` never goes below zero: the debit is a single
/// conditional update in the store, not a read-then-write.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreditBalance {
    /// User the balance belongs to
    pub user_id: UserId,

    /// Credits left to spend
    pub credits_remaining: u32,

    /// Lifetime credits consumed
    pub credits_used_total: u32,

    /// Subscription tier (e.g. "free", "pro", "enterprise")
    pub subscription_tier: String,
}

impl CreditBalance {
    /// Whether the user may start a generation. Enterprise accounts
    /// are exempt from the balance check.
    pub fn has_credits(&self) -> bool {
        self.credits_remaining > 0 || self.subscription_tier == ENTERPRISE_TIER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(remaining: u32, tier: &str) -> CreditBalance {
        CreditBalance {
            user_id: UserId::new(),
            credits_remaining: remaining,
            credits_used_total: 0,
            subscription_tier: tier.to_string(),
        }
    }

    #[test]
    fn zero_balance_has_no_credits() {
        assert!(!balance(0, "free").has_credits());
        assert!(balance(1, "free").has_credits());
    }

    #[test]
    fn enterprise_bypasses_balance() {
        assert!(balance(0, ENTERPRISE_TIER).has_credits());
    }
}
