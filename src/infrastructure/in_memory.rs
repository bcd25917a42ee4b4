use crate::config::{DeploymentConfig, OperatorKey};
use crate::domain::attestation::AttestationMessage;
use crate::domain::chain::{ChainDeployment, ChainId, Domain};
use crate::domain::contract::{ContractCall, LockParams};
use crate::domain::hook::HookMetadata;
use crate::domain::ports::{
    AttestationService, AttestationServiceError, ChainFailure, TransactionSender, TxReceipt, Wallet,
};
use alloy_primitives::{Address, B256, Bytes, TxHash, U256, keccak256};
use alloy_sol_types::{SolValue, sol};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

sol! {
    /// Cross-chain message emitted by a simulated burn.
    struct BurnMessage {
        uint32 sourceDomain;
        uint32 destinationDomain;
        uint64 nonce;
        bytes32 mintRecipient;
        bytes32 destinationCaller;
        uint256 amount;
        uint256 maxFee;
        bytes hookData;
    }
}

/// A payment credited by the simulated settlement vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledPayment {
    pub merchant: Address,
    pub order_id: String,
    pub amount: u64,
    pub payer: Option<Address>,
    pub source_domain: Option<Domain>,
    pub referral: Option<(u64, Address)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub chain_id: ChainId,
    pub from: Address,
    pub call: ContractCall,
    pub success: bool,
}

struct Burn {
    source_domain: Domain,
    message: Bytes,
}

#[derive(Default)]
struct Ledger {
    balances: HashMap<(ChainId, Address), u64>,
    allowances: HashMap<(ChainId, Address, Address), u64>,
    receipts: HashMap<TxHash, TxReceipt>,
    burns: HashMap<TxHash, Burn>,
    received: HashSet<B256>,
    settled_orders: HashSet<String>,
    settlements: Vec<SettledPayment>,
    merchant_balances: HashMap<Address, u64>,
    attestation_queries: HashMap<TxHash, u32>,
    calls: Vec<RecordedCall>,
    nonce: u64,
}

/// A thread-safe in-memory multi-chain ledger.
///
/// Models each chain's stable token, the bridge's burn-with-hook, the attestation service
/// and the settlement vault closely enough to run both payment routes end to end. Uses
/// `Arc<RwLock<..>>` so wallets, the operator signer and the attestation service can share it.
#[derive(Clone)]
pub struct SimulatedNetwork {
    config: Arc<DeploymentConfig>,
    ledger: Arc<RwLock<Ledger>>,
    attestation_delay: u32,
}

impl SimulatedNetwork {
    pub fn new(config: DeploymentConfig) -> Self {
        Self {
            config: Arc::new(config),
            ledger: Arc::new(RwLock::new(Ledger::default())),
            attestation_delay: 0,
        }
    }

    /// Number of queries per lock answered as pending before the attestation completes.
    pub fn with_attestation_delay(mut self, pending_polls: u32) -> Self {
        self.attestation_delay = pending_polls;
        self
    }

    pub fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    /// Credits `holder` with `amount` of the chain's stable token.
    pub async fn mint(&self, chain_id: ChainId, holder: Address, amount: u64) {
        let mut ledger = self.ledger.write().await;
        *ledger.balances.entry((chain_id, holder)).or_default() += amount;
    }

    pub async fn balance(&self, chain_id: ChainId, holder: Address) -> u64 {
        let ledger = self.ledger.read().await;
        ledger.balances.get(&(chain_id, holder)).copied().unwrap_or(0)
    }

    pub async fn allowance(&self, chain_id: ChainId, owner: Address, spender: Address) -> u64 {
        let ledger = self.ledger.read().await;
        ledger
            .allowances
            .get(&(chain_id, owner, spender))
            .copied()
            .unwrap_or(0)
    }

    pub async fn merchant_balance(&self, merchant: Address) -> u64 {
        let ledger = self.ledger.read().await;
        ledger.merchant_balances.get(&merchant).copied().unwrap_or(0)
    }

    pub async fn settlements(&self) -> Vec<SettledPayment> {
        self.ledger.read().await.settlements.clone()
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.ledger.read().await.calls.clone()
    }

    /// Total attestation queries answered, across all lock transactions.
    pub async fn attestation_queries(&self) -> u32 {
        self.ledger.read().await.attestation_queries.values().sum()
    }

    /// Executes `call` on `chain_id` as `from` and returns the receipt.
    ///
    /// Reverts are reported through the receipt, never as an `Err`.
    pub async fn execute(&self, chain_id: ChainId, from: Address, call: ContractCall) -> TxReceipt {
        let mut ledger = self.ledger.write().await;
        ledger.nonce += 1;
        let hash = tx_hash(chain_id, ledger.nonce);

        let outcome = match self.config.chain(chain_id) {
            Some(chain) => self.apply(&mut ledger, chain, from, &call, hash),
            None => Err(format!("unknown chain {chain_id}")),
        };
        let receipt = TxReceipt {
            hash,
            success: outcome.is_ok(),
            revert_reason: outcome.err(),
        };
        debug!(
            chain = %chain_id,
            step = call.step(),
            success = receipt.success,
            "Simulated transaction executed"
        );

        ledger.calls.push(RecordedCall {
            chain_id,
            from,
            call,
            success: receipt.success,
        });
        ledger.receipts.insert(hash, receipt.clone());
        receipt
    }

    async fn receipt(&self, hash: TxHash) -> Result<TxReceipt, ChainFailure> {
        self.ledger
            .read()
            .await
            .receipts
            .get(&hash)
            .cloned()
            .ok_or_else(|| ChainFailure::Transport(format!("unknown transaction {hash}")))
    }

    fn apply(
        &self,
        ledger: &mut Ledger,
        chain: &ChainDeployment,
        from: Address,
        call: &ContractCall,
        hash: TxHash,
    ) -> Result<(), String> {
        match call {
            ContractCall::Approve {
                token,
                spender,
                amount,
            } => {
                if *token != chain.token {
                    return Err(format!("no token contract at {token}"));
                }
                ledger
                    .allowances
                    .insert((chain.chain_id, from, *spender), *amount);
                Ok(())
            }
            ContractCall::Pay {
                vault,
                amount,
                merchant,
                order_id,
            } => {
                self.require_vault(chain, *vault)?;
                if ledger.settled_orders.contains(order_id.as_str()) {
                    return Err("order already paid".to_string());
                }
                spend(ledger, chain.chain_id, from, *vault, *amount)?;
                credit_merchant(
                    ledger,
                    SettledPayment {
                        merchant: *merchant,
                        order_id: order_id.as_str().to_string(),
                        amount: *amount,
                        payer: Some(from),
                        source_domain: None,
                        referral: None,
                    },
                );
                Ok(())
            }
            ContractCall::LockAndEmitHook(params) => self.burn(ledger, chain, from, params, hash),
            ContractCall::Finalize {
                target,
                message,
                attestation,
            } => self.receive(ledger, chain, from, *target, message, attestation),
        }
    }

    fn require_vault(&self, chain: &ChainDeployment, vault: Address) -> Result<(), String> {
        if chain.chain_id != self.config.settlement_chain || vault != self.config.vault {
            return Err(format!("no vault at {vault} on chain {}", chain.chain_id));
        }
        Ok(())
    }

    fn burn(
        &self,
        ledger: &mut Ledger,
        chain: &ChainDeployment,
        from: Address,
        params: &LockParams,
        hash: TxHash,
    ) -> Result<(), String> {
        if params.bridge != chain.bridge {
            return Err(format!("no bridge at {}", params.bridge));
        }
        if params.burn_token != chain.token {
            return Err("burn token not supported".to_string());
        }
        if params.max_fee >= params.amount {
            return Err("max fee must be less than amount".to_string());
        }
        spend(ledger, chain.chain_id, from, params.bridge, params.amount)?;

        let message = BurnMessage {
            sourceDomain: chain.domain.0,
            destinationDomain: params.destination_domain.0,
            nonce: ledger.nonce,
            mintRecipient: params.mint_recipient,
            destinationCaller: params.destination_caller,
            amount: U256::from(params.amount),
            maxFee: U256::from(params.max_fee),
            hookData: params.hook_data.clone(),
        };
        ledger.burns.insert(
            hash,
            Burn {
                source_domain: chain.domain,
                message: Bytes::from(message.abi_encode()),
            },
        );
        Ok(())
    }

    fn receive(
        &self,
        ledger: &mut Ledger,
        chain: &ChainDeployment,
        from: Address,
        target: Address,
        message: &Bytes,
        attestation: &Bytes,
    ) -> Result<(), String> {
        if chain.chain_id != self.config.settlement_chain || target != chain.message_transmitter {
            return Err(format!("no message transmitter at {target}"));
        }
        let digest = keccak256(message);
        if attestation[..] != digest[..] {
            return Err("invalid attestation".to_string());
        }
        let burn = BurnMessage::abi_decode(message, true)
            .map_err(|e| format!("malformed message: {e}"))?;
        if burn.destinationDomain != chain.domain.0 {
            return Err("invalid destination domain".to_string());
        }
        if burn.destinationCaller != B256::ZERO && burn.destinationCaller != from.into_word() {
            return Err("invalid caller for message".to_string());
        }
        if ledger.received.contains(&digest) {
            return Err("message already received".to_string());
        }
        if burn.mintRecipient != self.config.vault.into_word() {
            return Err("mint recipient is not the vault".to_string());
        }

        let hook = HookMetadata::decode(&burn.hookData).map_err(|e| e.to_string())?;
        if ledger.settled_orders.contains(&hook.order_id) {
            return Err("order already paid".to_string());
        }
        let total = u64::try_from(burn.amount).map_err(|_| "amount out of range".to_string())?;
        let fee = u64::try_from(burn.maxFee).map_err(|_| "fee out of range".to_string())?;

        ledger.received.insert(digest);
        credit_merchant(
            ledger,
            SettledPayment {
                merchant: hook.merchant,
                order_id: hook.order_id,
                amount: total - fee,
                payer: None,
                source_domain: Some(Domain(burn.sourceDomain)),
                referral: hook.referral,
            },
        );
        Ok(())
    }
}

fn tx_hash(chain_id: ChainId, nonce: u64) -> TxHash {
    let mut preimage = [0u8; 16];
    preimage[..8].copy_from_slice(&chain_id.0.to_be_bytes());
    preimage[8..].copy_from_slice(&nonce.to_be_bytes());
    keccak256(preimage)
}

fn spend(
    ledger: &mut Ledger,
    chain_id: ChainId,
    owner: Address,
    spender: Address,
    amount: u64,
) -> Result<(), String> {
    let allowance = ledger
        .allowances
        .get(&(chain_id, owner, spender))
        .copied()
        .unwrap_or(0);
    if allowance < amount {
        return Err("ERC20: insufficient allowance".to_string());
    }
    let balance = ledger.balances.get(&(chain_id, owner)).copied().unwrap_or(0);
    if balance < amount {
        return Err("ERC20: transfer amount exceeds balance".to_string());
    }
    ledger
        .allowances
        .insert((chain_id, owner, spender), allowance - amount);
    ledger.balances.insert((chain_id, owner), balance - amount);
    Ok(())
}

fn credit_merchant(ledger: &mut Ledger, payment: SettledPayment) {
    *ledger.merchant_balances.entry(payment.merchant).or_default() += payment.amount;
    ledger.settled_orders.insert(payment.order_id.clone());
    ledger.settlements.push(payment);
}

#[async_trait]
impl AttestationService for SimulatedNetwork {
    async fn fetch(
        &self,
        source_domain: Domain,
        tx_hash: TxHash,
    ) -> Result<Option<AttestationMessage>, AttestationServiceError> {
        let mut ledger = self.ledger.write().await;
        let seen = {
            let counter = ledger.attestation_queries.entry(tx_hash).or_default();
            *counter += 1;
            *counter
        };
        let Some(burn) = ledger.burns.get(&tx_hash) else {
            return Ok(None);
        };
        if burn.source_domain != source_domain {
            return Ok(None);
        }
        if seen <= self.attestation_delay {
            return Ok(Some(AttestationMessage::pending()));
        }
        let digest = keccak256(&burn.message);
        Ok(Some(AttestationMessage::complete(&burn.message, digest.as_slice())))
    }
}

/// Payer wallet connected to a [`SimulatedNetwork`].
pub struct SimulatedWallet {
    network: SimulatedNetwork,
    account: Option<Address>,
    chain_id: AtomicU64,
    reject_switch: bool,
    rejected_steps: HashSet<&'static str>,
}

impl SimulatedWallet {
    pub fn connected(network: SimulatedNetwork, account: Address, chain_id: ChainId) -> Self {
        Self {
            network,
            account: Some(account),
            chain_id: AtomicU64::new(chain_id.0),
            reject_switch: false,
            rejected_steps: HashSet::new(),
        }
    }

    pub fn disconnected(network: SimulatedNetwork) -> Self {
        Self {
            network,
            account: None,
            chain_id: AtomicU64::new(0),
            reject_switch: false,
            rejected_steps: HashSet::new(),
        }
    }

    /// The payer declines any network switch prompt.
    pub fn rejecting_chain_switch(mut self) -> Self {
        self.reject_switch = true;
        self
    }

    /// The payer declines to sign calls for `step` (e.g. `"approve"`).
    pub fn rejecting(mut self, step: &'static str) -> Self {
        self.rejected_steps.insert(step);
        self
    }
}

#[async_trait]
impl TransactionSender for SimulatedWallet {
    async fn send_transaction(&self, call: ContractCall) -> Result<TxHash, ChainFailure> {
        let (Some(account), Some(chain_id)) = (self.account, self.chain_id()) else {
            return Err(ChainFailure::Transport("wallet not connected".to_string()));
        };
        if self.rejected_steps.contains(call.step()) {
            return Err(ChainFailure::Rejected("User denied transaction signature".to_string()));
        }
        Ok(self.network.execute(chain_id, account, call).await.hash)
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt, ChainFailure> {
        self.network.receipt(hash).await
    }
}

#[async_trait]
impl Wallet for SimulatedWallet {
    fn account(&self) -> Option<Address> {
        self.account
    }

    fn chain_id(&self) -> Option<ChainId> {
        match self.chain_id.load(Ordering::SeqCst) {
            0 => None,
            id => Some(ChainId(id)),
        }
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ChainFailure> {
        if self.account.is_none() {
            return Err(ChainFailure::Transport("wallet not connected".to_string()));
        }
        if self.reject_switch {
            return Err(ChainFailure::Rejected("User rejected the request".to_string()));
        }
        if self.network.config().chain(chain_id).is_none() {
            return Err(ChainFailure::Transport(format!("unrecognized chain {chain_id}")));
        }
        self.chain_id.store(chain_id.0, Ordering::SeqCst);
        Ok(())
    }
}

/// Operator signer submitting on the settlement chain.
///
/// The simulated account is derived from the key's hash; there is no real signing.
pub struct SimulatedOperator {
    network: SimulatedNetwork,
    address: Address,
}

impl SimulatedOperator {
    pub fn new(network: SimulatedNetwork, key: &OperatorKey) -> Self {
        let digest = keccak256(key.as_bytes());
        Self {
            network,
            address: Address::from_slice(&digest[12..]),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl TransactionSender for SimulatedOperator {
    async fn send_transaction(&self, call: ContractCall) -> Result<TxHash, ChainFailure> {
        let chain_id = self.network.config().settlement_chain;
        Ok(self.network.execute(chain_id, self.address, call).await.hash)
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt, ChainFailure> {
        self.network.receipt(hash).await
    }
}
