//! Shared send/confirm helpers mapping port failures onto [`PaymentError`].

use crate::domain::contract::ContractCall;
use crate::domain::ports::{ChainFailure, TransactionSender};
use crate::error::{PaymentError, Result};
use alloy_primitives::TxHash;
use tracing::debug;

pub(crate) async fn send<S>(sender: &S, call: ContractCall) -> Result<TxHash>
where
    S: TransactionSender + ?Sized,
{
    let step = call.step();
    let target = call.target();
    let hash = sender
        .send_transaction(call)
        .await
        .map_err(|failure| into_payment_error(step, failure))?;
    debug!(step, %target, tx = %hash, "Transaction submitted");
    Ok(hash)
}

pub(crate) async fn confirm<S>(sender: &S, step: &'static str, hash: TxHash) -> Result<TxHash>
where
    S: TransactionSender + ?Sized,
{
    let receipt = sender
        .wait_for_receipt(hash)
        .await
        .map_err(|failure| into_payment_error(step, failure))?;
    if !receipt.success {
        return Err(PaymentError::ChainError {
            step,
            reason: receipt.revert_reason,
        });
    }
    debug!(step, tx = %receipt.hash, "Transaction confirmed");
    Ok(receipt.hash)
}

pub(crate) async fn send_and_confirm<S>(sender: &S, call: ContractCall) -> Result<TxHash>
where
    S: TransactionSender + ?Sized,
{
    let step = call.step();
    let hash = send(sender, call).await?;
    confirm(sender, step, hash).await
}

fn into_payment_error(step: &'static str, failure: ChainFailure) -> PaymentError {
    match failure {
        ChainFailure::Rejected(reason) => {
            PaymentError::UserRejection(format!("{step} rejected: {reason}"))
        }
        ChainFailure::Reverted(reason) => PaymentError::ChainError { step, reason },
        ChainFailure::Transport(reason) => PaymentError::ChainError {
            step,
            reason: Some(reason),
        },
    }
}
