//! Credit ledger.
//!
//! Thin façade over the credit store: one debit before a run starts,
//! at most one compensating credit if the run does not complete.

use std::sync::Arc;

use tracing::{info, warn};

use genvid_db::{CreditStore, StoreError};
use genvid_models::UserId;

use crate::error::{EngineError, EngineResult};

#[derive(Clone)]
pub struct CreditLedger {
    store: Arc<dyn CreditStore>,
}

impl CreditLedger {
    pub fn new(store: Arc<dyn CreditStore>) -> Self {
        Self { store }
    }

    /// Whether the user may start a generation. Enterprise-tier users
    /// pass regardless of balance.
    pub async fn has_credits(&self, user_id: &UserId) -> EngineResult<bool> {
        let balance = self.store.get_balance(user_id).await?;
        Ok(balance.has_credits())
    }

    /// Take one credit. Fails with `InsufficientCredits` when the
    /// balance is already zero.
    pub async fn debit_one(&self, user_id: &UserId) -> EngineResult<()> {
        match self.store.debit_credit(user_id).await {
            Ok(()) => {
                info!(user_id = %user_id, "Debited one credit");
                Ok(())
            }
            Err(StoreError::NoCreditsRemaining) => Err(EngineError::InsufficientCredits),
            Err(e) => Err(e.into()),
        }
    }

    /// Refund one credit. Failures are logged, not propagated: the
    /// refund runs on the background path where no caller is waiting.
    pub async fn credit_one(&self, user_id: &UserId) {
        match self.store.credit_credit(user_id, 1).await {
            Ok(()) => info!(user_id = %user_id, "Refunded one credit"),
            Err(e) => warn!(user_id = %user_id, error = %e, "Failed to refund credit"),
        }
    }
}
