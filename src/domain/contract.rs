//! Contract calls a payment can submit, and their ABI calldata.

use super::chain::Domain;
use super::payment::OrderId;
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::{SolCall, sol};

sol! {
    function approve(address spender, uint256 amount) external returns (bool);

    function pay(uint256 amount, address merchant, string orderId) external;

    function depositForBurnWithHook(
        uint256 amount,
        uint32 destinationDomain,
        bytes32 mintRecipient,
        address burnToken,
        bytes32 destinationCaller,
        uint256 maxFee,
        uint32 minFinalityThreshold,
        bytes hookData
    ) external returns (uint64 nonce);

    function receiveMessage(bytes message, bytes attestation) external returns (bool success);
}

/// Arguments of the source-chain lock that carries the settlement hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockParams {
    pub bridge: Address,
    /// Payment amount plus fee.
    pub amount: u64,
    pub destination_domain: Domain,
    pub mint_recipient: B256,
    pub burn_token: Address,
    /// Zero means any relayer may finalize.
    pub destination_caller: B256,
    pub max_fee: u64,
    pub min_finality_threshold: u32,
    pub hook_data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    Approve {
        token: Address,
        spender: Address,
        amount: u64,
    },
    Pay {
        vault: Address,
        amount: u64,
        merchant: Address,
        order_id: OrderId,
    },
    LockAndEmitHook(LockParams),
    Finalize {
        target: Address,
        message: Bytes,
        attestation: Bytes,
    },
}

impl ContractCall {
    /// Contract the transaction is sent to.
    pub fn target(&self) -> Address {
        match self {
            ContractCall::Approve { token, .. } => *token,
            ContractCall::Pay { vault, .. } => *vault,
            ContractCall::LockAndEmitHook(params) => params.bridge,
            ContractCall::Finalize { target, .. } => *target,
        }
    }

    /// Step name used in error messages and logs.
    pub fn step(&self) -> &'static str {
        match self {
            ContractCall::Approve { .. } => "approve",
            ContractCall::Pay { .. } => "pay",
            ContractCall::LockAndEmitHook(_) => "lock",
            ContractCall::Finalize { .. } => "finalize",
        }
    }

    pub fn calldata(&self) -> Bytes {
        let encoded = match self {
            ContractCall::Approve {
                spender, amount, ..
            } => approveCall {
                spender: *spender,
                amount: U256::from(*amount),
            }
            .abi_encode(),
            ContractCall::Pay {
                amount,
                merchant,
                order_id,
                ..
            } => payCall {
                amount: U256::from(*amount),
                merchant: *merchant,
                orderId: order_id.as_str().to_string(),
            }
            .abi_encode(),
            ContractCall::LockAndEmitHook(params) => depositForBurnWithHookCall {
                amount: U256::from(params.amount),
                destinationDomain: params.destination_domain.0,
                mintRecipient: params.mint_recipient,
                burnToken: params.burn_token,
                destinationCaller: params.destination_caller,
                maxFee: U256::from(params.max_fee),
                minFinalityThreshold: params.min_finality_threshold,
                hookData: params.hook_data.clone(),
            }
            .abi_encode(),
            ContractCall::Finalize {
                message,
                attestation,
                ..
            } => receiveMessageCall {
                message: message.clone(),
                attestation: attestation.clone(),
            }
            .abi_encode(),
        };
        Bytes::from(encoded)
    }
}
