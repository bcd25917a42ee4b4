use super::submission;
use crate::config::{FinalizerKind, OperatorKey};
use crate::domain::attestation::AttestationRecord;
use crate::domain::chain::ChainDeployment;
use crate::domain::contract::ContractCall;
use crate::domain::ports::{ChainFailure, TransactionSenderRef, Wallet};
use crate::error::{PaymentError, Result};
use alloy_primitives::TxHash;
use tracing::info;

/// Who submits `receiveMessage` on the settlement chain.
pub enum Finalizer {
    /// The payer's wallet, after switching networks.
    UserSigned,
    /// A process-wide operator signer. The key is kept only to scrub it from error text.
    OperatorRelayed {
        signer: TransactionSenderRef,
        key: OperatorKey,
    },
}

impl Finalizer {
    pub fn from_kind(
        kind: FinalizerKind,
        operator: Option<(TransactionSenderRef, OperatorKey)>,
    ) -> Result<Self> {
        match (kind, operator) {
            (FinalizerKind::UserSigned, _) => Ok(Finalizer::UserSigned),
            (FinalizerKind::OperatorRelayed, Some((signer, key))) => {
                Ok(Finalizer::OperatorRelayed { signer, key })
            }
            (FinalizerKind::OperatorRelayed, None) => Err(PaymentError::ConfigError(
                "operator_relayed finalizer requires an operator key".to_string(),
            )),
        }
    }

    pub fn kind(&self) -> FinalizerKind {
        match self {
            Finalizer::UserSigned => FinalizerKind::UserSigned,
            Finalizer::OperatorRelayed { .. } => FinalizerKind::OperatorRelayed,
        }
    }

    /// Submits the finalize call exactly once and waits for its receipt.
    pub async fn finalize<W>(
        &self,
        wallet: &W,
        settlement: &ChainDeployment,
        record: &AttestationRecord,
    ) -> Result<TxHash>
    where
        W: Wallet + ?Sized,
    {
        let call = ContractCall::Finalize {
            target: settlement.message_transmitter,
            message: record.message().clone(),
            attestation: record.attestation().clone(),
        };

        match self {
            Finalizer::UserSigned => {
                if wallet.chain_id() != Some(settlement.chain_id) {
                    info!(chain = %settlement.chain_id, "Switching wallet to settlement chain");
                    wallet
                        .switch_chain(settlement.chain_id)
                        .await
                        .map_err(|failure| match failure {
                            ChainFailure::Rejected(reason) => PaymentError::UserRejection(format!(
                                "Switch to {} rejected: {reason}",
                                settlement.name
                            )),
                            other => PaymentError::FinalizationError(format!(
                                "could not switch to {}: {other}",
                                settlement.name
                            )),
                        })?;
                }
                submission::send_and_confirm(wallet, call)
                    .await
                    .map_err(|e| match e {
                        PaymentError::UserRejection(_) => e,
                        other => PaymentError::FinalizationError(other.to_string()),
                    })
            }
            Finalizer::OperatorRelayed { signer, key } => {
                submission::send_and_confirm(signer.as_ref(), call)
                    .await
                    .map_err(|e| PaymentError::FinalizationError(key.redact(&e.to_string())))
            }
        }
    }
}

impl std::fmt::Debug for Finalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finalizer::UserSigned => f.write_str("UserSigned"),
            Finalizer::OperatorRelayed { key, .. } => f
                .debug_struct("OperatorRelayed")
                .field("key", key)
                .finish_non_exhaustive(),
        }
    }
}
