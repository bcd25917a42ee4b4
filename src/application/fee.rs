use crate::config::FeePolicy;
use crate::domain::amount::Amount;
use crate::error::{PaymentError, Result};

/// Amounts of one bridged payment after the fee policy is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub amount: Amount,
    pub fee: u64,
    /// What leaves the payer's wallet: `amount + fee`.
    pub total: Amount,
}

#[derive(Debug, Clone, Copy)]
pub struct FeeModel {
    policy: FeePolicy,
}

impl FeeModel {
    pub fn new(policy: FeePolicy) -> Self {
        Self { policy }
    }

    pub fn fee(&self) -> u64 {
        match self.policy {
            FeePolicy::Waived => 0,
            FeePolicy::Charged { amount } => amount,
        }
    }

    pub fn quote(&self, amount: Amount) -> Result<FeeQuote> {
        let fee = self.fee();
        let total = amount.checked_add(fee).ok_or_else(|| {
            PaymentError::ValidationError(format!("Amount {amount} plus fee overflows"))
        })?;
        Ok(FeeQuote { amount, fee, total })
    }
}
