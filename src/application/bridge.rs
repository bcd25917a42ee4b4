use super::attestation::AttestationClient;
use super::fee::FeeModel;
use super::finalizer::Finalizer;
use super::submission;
use crate::config::DeploymentConfig;
use crate::domain::chain::{ChainDeployment, address_to_bytes32};
use crate::domain::contract::{ContractCall, LockParams};
use crate::domain::hook::encode_hook_data;
use crate::domain::payment::{PaymentAttempt, PaymentRequest, RouteKind, SettlementResult};
use crate::domain::ports::Wallet;
use crate::domain::state::PaymentStatus;
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

/// Cross-chain flow: lock on the source chain with settlement metadata attached,
/// wait for the attestation, then finalize on the settlement chain.
pub struct BridgeOrchestrator {
    config: Arc<DeploymentConfig>,
    fees: FeeModel,
    attestations: AttestationClient,
    finalizer: Finalizer,
}

impl BridgeOrchestrator {
    pub fn new(
        config: Arc<DeploymentConfig>,
        attestations: AttestationClient,
        finalizer: Finalizer,
    ) -> Self {
        let fees = FeeModel::new(config.fee);
        Self {
            config,
            fees,
            attestations,
            finalizer,
        }
    }

    pub async fn execute<W>(
        &self,
        wallet: &W,
        source: &ChainDeployment,
        settlement: &ChainDeployment,
        request: &PaymentRequest,
        attempt: &mut PaymentAttempt,
    ) -> Result<SettlementResult>
    where
        W: Wallet + ?Sized,
    {
        let quote = self.fees.quote(request.amount)?;
        attempt.set_fee(quote.fee);

        attempt.advance(PaymentStatus::Approving, "Approving USDC...")?;
        submission::send_and_confirm(
            wallet,
            ContractCall::Approve {
                token: source.token,
                spender: source.bridge,
                amount: quote.total.units(),
            },
        )
        .await?;

        attempt.advance(
            PaymentStatus::Locking,
            format!("Bridging USDC from {}...", source.name),
        )?;
        let lock = LockParams {
            bridge: source.bridge,
            amount: quote.total.units(),
            destination_domain: settlement.domain,
            mint_recipient: address_to_bytes32(self.config.vault),
            burn_token: source.token,
            destination_caller: address_to_bytes32(self.config.destination_caller),
            max_fee: quote.fee,
            min_finality_threshold: self.config.min_finality_threshold,
            hook_data: encode_hook_data(request.merchant, &request.order_id, &request.referral),
        };
        let lock_tx = submission::send_and_confirm(wallet, ContractCall::LockAndEmitHook(lock)).await?;
        info!(tx = %lock_tx, total = quote.total.units(), "Funds locked on source chain");

        attempt.advance(PaymentStatus::Attesting, "Waiting for attestation...")?;
        let record = self
            .attestations
            .await_attestation(source.domain, lock_tx)
            .await?;

        attempt.advance(
            PaymentStatus::Finalizing,
            format!("Completing payment on {}...", settlement.name),
        )?;
        let settlement_tx = self.finalizer.finalize(wallet, settlement, &record).await?;

        attempt.advance(PaymentStatus::Success, "Payment successful!")?;
        Ok(SettlementResult {
            order_id: request.order_id.clone(),
            route: RouteKind::Bridged,
            amount: request.amount,
            fee: quote.fee,
            lock_tx: Some(lock_tx),
            settlement_tx,
        })
    }
}
