use super::submission;
use crate::domain::chain::ChainDeployment;
use crate::domain::contract::ContractCall;
use crate::domain::payment::{PaymentAttempt, PaymentRequest, RouteKind, SettlementResult};
use crate::domain::ports::Wallet;
use crate::domain::state::PaymentStatus;
use crate::error::Result;
use alloy_primitives::Address;

/// Same-chain flow: approve the vault, then call `pay` on it.
///
/// A failed `pay` can leave the approval in place. That allowance is not revoked;
/// the next attempt's approve overwrites it.
#[derive(Debug, Clone)]
pub struct DirectSettlement {
    vault: Address,
}

impl DirectSettlement {
    pub fn new(vault: Address) -> Self {
        Self { vault }
    }

    pub async fn execute<W>(
        &self,
        wallet: &W,
        settlement: &ChainDeployment,
        request: &PaymentRequest,
        attempt: &mut PaymentAttempt,
    ) -> Result<SettlementResult>
    where
        W: Wallet + ?Sized,
    {
        let amount = request.amount.units();

        attempt.advance(PaymentStatus::Approving, "Approving USDC...")?;
        submission::send_and_confirm(
            wallet,
            ContractCall::Approve {
                token: settlement.token,
                spender: self.vault,
                amount,
            },
        )
        .await?;

        attempt.advance(PaymentStatus::Paying, "Processing payment...")?;
        let pay_tx = submission::send(
            wallet,
            ContractCall::Pay {
                vault: self.vault,
                amount,
                merchant: request.merchant,
                order_id: request.order_id.clone(),
            },
        )
        .await?;

        attempt.advance(PaymentStatus::Finalizing, "Confirming payment...")?;
        let settlement_tx = submission::confirm(wallet, "pay", pay_tx).await?;

        attempt.advance(PaymentStatus::Success, "Payment successful!")?;
        Ok(SettlementResult {
            order_id: request.order_id.clone(),
            route: RouteKind::Direct,
            amount: request.amount,
            fee: 0,
            lock_tx: None,
            settlement_tx,
        })
    }
}
