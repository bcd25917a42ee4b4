use super::attestation::AttestationMessage;
use super::chain::{ChainId, Domain};
use super::contract::ContractCall;
use alloy_primitives::{Address, TxHash};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a wallet or signer while submitting or confirming a call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainFailure {
    #[error("request rejected by signer: {0}")]
    Rejected(String),
    #[error("transaction reverted: {}", .0.as_deref().unwrap_or("no reason reported"))]
    Reverted(Option<String>),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Failure of a single attestation service query.
#[derive(Error, Debug)]
pub enum AttestationServiceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub hash: TxHash,
    pub success: bool,
    pub revert_reason: Option<String>,
}

/// Submits contract calls and waits for their receipts.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    async fn send_transaction(&self, call: ContractCall) -> Result<TxHash, ChainFailure>;
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt, ChainFailure>;
}

/// The payer's connected wallet.
#[async_trait]
pub trait Wallet: TransactionSender {
    /// Connected account, `None` when no wallet is connected.
    fn account(&self) -> Option<Address>;
    fn chain_id(&self) -> Option<ChainId>;
    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ChainFailure>;
}

/// Looks up the attestation for a lock transaction.
#[async_trait]
pub trait AttestationService: Send + Sync {
    /// `Ok(None)` means the service has no record for the transaction yet.
    async fn fetch(
        &self,
        source_domain: Domain,
        tx_hash: TxHash,
    ) -> Result<Option<AttestationMessage>, AttestationServiceError>;
}

pub type TransactionSenderRef = Arc<dyn TransactionSender>;
pub type WalletRef = Arc<dyn Wallet>;
pub type AttestationServiceRef = Arc<dyn AttestationService>;
