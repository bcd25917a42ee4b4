mod common;

use alloy_primitives::{B256, TxHash};
use async_trait::async_trait;
use common::*;
use nexuspay::application::finalizer::Finalizer;
use nexuspay::config::{FeePolicy, OperatorKey};
use nexuspay::domain::chain::address_to_bytes32;
use nexuspay::domain::contract::ContractCall;
use nexuspay::domain::hook::HookMetadata;
use nexuspay::domain::payment::{Referral, RouteKind};
use nexuspay::domain::ports::{ChainFailure, TransactionSender, TxReceipt};
use nexuspay::domain::state::PaymentStatus;
use nexuspay::error::PaymentError;
use nexuspay::infrastructure::in_memory::{SimulatedNetwork, SimulatedOperator, SimulatedWallet};
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn test_cross_chain_payment_locks_attests_and_finalizes_once() {
    let network = SimulatedNetwork::new(testnet()).with_attestation_delay(2);
    network.mint(BASE_SEPOLIA, PAYER, 5_020_000).await;
    let engine = engine(&network, Finalizer::UserSigned);
    let wallet = SimulatedWallet::connected(network.clone(), PAYER, BASE_SEPOLIA);
    let recorder = RecordingObserver::new();

    let result = engine
        .execute_payment(&wallet, &request("ORD-1", 5_000_000), observers(&recorder))
        .await
        .unwrap();

    assert_eq!(result.route, RouteKind::Bridged);
    assert_eq!(result.fee, 20_000);
    assert_eq!(result.amount.units(), 5_000_000);
    assert!(result.lock_tx.is_some());
    assert_eq!(
        recorder.statuses(),
        vec![
            PaymentStatus::Approving,
            PaymentStatus::Locking,
            PaymentStatus::Attesting,
            PaymentStatus::Finalizing,
            PaymentStatus::Success
        ]
    );

    let config = network.config().clone();
    let source = config.chain(BASE_SEPOLIA).unwrap().clone();
    let settlement = config.settlement().unwrap().clone();
    let calls = network.calls().await;

    assert_eq!(
        calls_for_step(&calls, "approve"),
        vec![ContractCall::Approve {
            token: source.token,
            spender: source.bridge,
            amount: 5_020_000,
        }]
    );

    let locks = calls_for_step(&calls, "lock");
    assert_eq!(locks.len(), 1);
    let ContractCall::LockAndEmitHook(lock) = &locks[0] else {
        panic!("expected lock call");
    };
    assert_eq!(lock.amount, 5_020_000);
    assert_eq!(lock.max_fee, 20_000);
    assert_eq!(lock.destination_domain, settlement.domain);
    assert_eq!(lock.mint_recipient, address_to_bytes32(config.vault));
    assert_eq!(lock.destination_caller, B256::ZERO);
    assert_eq!(lock.min_finality_threshold, 1000);
    let hook = HookMetadata::decode(&lock.hook_data).unwrap();
    assert_eq!(hook.merchant, MERCHANT);
    assert_eq!(hook.order_id, "ORD-1");
    assert_eq!(hook.referral, None);

    let finalizes = calls_for_step(&calls, "finalize");
    assert_eq!(finalizes.len(), 1);
    let finalize_call = calls.iter().find(|c| c.call.step() == "finalize").unwrap();
    assert_eq!(finalize_call.chain_id, ARC_TESTNET);
    assert_eq!(finalize_call.from, PAYER);

    assert_eq!(network.attestation_queries().await, 3);
    assert_eq!(network.merchant_balance(MERCHANT).await, 5_000_000);
    assert_eq!(network.balance(BASE_SEPOLIA, PAYER).await, 0);

    // A second submission of the same message is refused by the destination.
    let replay = network
        .execute(ARC_TESTNET, PAYER, finalizes[0].clone())
        .await;
    assert!(!replay.success);
    assert_eq!(
        replay.revert_reason.as_deref(),
        Some("message already received")
    );
    assert_eq!(network.merchant_balance(MERCHANT).await, 5_000_000);
}

#[tokio::test]
async fn test_waived_fee_locks_exact_amount() {
    let mut config = testnet();
    config.fee = FeePolicy::Waived;
    let network = SimulatedNetwork::new(config);
    network.mint(BASE_SEPOLIA, PAYER, 5_000_000).await;
    let engine = engine(&network, Finalizer::UserSigned);
    let wallet = SimulatedWallet::connected(network.clone(), PAYER, BASE_SEPOLIA);

    let result = engine
        .execute_payment(&wallet, &request("ORD-1", 5_000_000), Vec::new())
        .await
        .unwrap();

    assert_eq!(result.fee, 0);
    let locks = calls_for_step(&network.calls().await, "lock");
    let ContractCall::LockAndEmitHook(lock) = &locks[0] else {
        panic!("expected lock call");
    };
    assert_eq!(lock.amount, 5_000_000);
    assert_eq!(lock.max_fee, 0);
    assert_eq!(network.merchant_balance(MERCHANT).await, 5_000_000);
}

#[tokio::test]
async fn test_referral_is_carried_to_settlement() {
    let network = SimulatedNetwork::new(testnet());
    network.mint(BASE_SEPOLIA, PAYER, 1_020_000).await;
    let engine = engine(&network, Finalizer::UserSigned);
    let wallet = SimulatedWallet::connected(network.clone(), PAYER, BASE_SEPOLIA);

    let request = request("ORD-REF", 1_000_000).with_referral(Referral::new(42, REFERRER));
    engine
        .execute_payment(&wallet, &request, Vec::new())
        .await
        .unwrap();

    let settlements = network.settlements().await;
    assert_eq!(settlements.len(), 1);
    assert_eq!(settlements[0].referral, Some((42, REFERRER)));
    assert_eq!(settlements[0].order_id, "ORD-REF");
    assert_eq!(settlements[0].amount, 1_000_000);
}

#[tokio::test(start_paused = true)]
async fn test_attestation_timeout_never_finalizes() {
    let network = SimulatedNetwork::new(testnet()).with_attestation_delay(u32::MAX);
    network.mint(BASE_SEPOLIA, PAYER, 5_020_000).await;
    let engine = engine(&network, Finalizer::UserSigned);
    let wallet = SimulatedWallet::connected(network.clone(), PAYER, BASE_SEPOLIA);
    let recorder = RecordingObserver::new();

    let err = engine
        .execute_payment(&wallet, &request("ORD-1", 5_000_000), observers(&recorder))
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::AttestationTimeout { attempts: 20 }));
    assert_eq!(
        recorder.statuses(),
        vec![
            PaymentStatus::Approving,
            PaymentStatus::Locking,
            PaymentStatus::Attesting,
            PaymentStatus::Error
        ]
    );
    let last = recorder.transitions().pop().unwrap();
    assert_eq!(last.from, PaymentStatus::Attesting);
    assert!(last.message.contains("after 20 attempts"));

    assert_eq!(network.attestation_queries().await, 20);
    assert!(calls_for_step(&network.calls().await, "finalize").is_empty());
}

#[tokio::test]
async fn test_rejected_network_switch_is_terminal() {
    let network = SimulatedNetwork::new(testnet());
    network.mint(BASE_SEPOLIA, PAYER, 5_020_000).await;
    let engine = engine(&network, Finalizer::UserSigned);
    let wallet = SimulatedWallet::connected(network.clone(), PAYER, BASE_SEPOLIA)
        .rejecting_chain_switch();
    let recorder = RecordingObserver::new();

    let err = engine
        .execute_payment(&wallet, &request("ORD-1", 5_000_000), observers(&recorder))
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::UserRejection(_)));
    assert_eq!(
        recorder.statuses().last(),
        Some(&PaymentStatus::Error)
    );
    assert!(calls_for_step(&network.calls().await, "finalize").is_empty());
    // Funds stay locked; nothing is rolled back.
    assert_eq!(network.balance(BASE_SEPOLIA, PAYER).await, 0);
    assert_eq!(network.merchant_balance(MERCHANT).await, 0);
}

#[tokio::test]
async fn test_operator_relays_finalize() {
    let network = SimulatedNetwork::new(testnet());
    network.mint(BASE_SEPOLIA, PAYER, 5_020_000).await;
    let key = OperatorKey::from_hex(OPERATOR_KEY_HEX).unwrap();
    let operator = SimulatedOperator::new(network.clone(), &key);
    let operator_address = operator.address();
    let finalizer = Finalizer::OperatorRelayed {
        signer: Arc::new(operator),
        key,
    };
    let engine = engine(&network, finalizer);
    let wallet = SimulatedWallet::connected(network.clone(), PAYER, BASE_SEPOLIA)
        .rejecting_chain_switch();

    engine
        .execute_payment(&wallet, &request("ORD-1", 5_000_000), Vec::new())
        .await
        .unwrap();

    let calls = network.calls().await;
    let finalize = calls.iter().find(|c| c.call.step() == "finalize").unwrap();
    assert_eq!(finalize.from, operator_address);
    assert_eq!(finalize.chain_id, ARC_TESTNET);
    assert_eq!(network.merchant_balance(MERCHANT).await, 5_000_000);
}

/// Signer whose failures echo its secret, as a misbehaving RPC provider might.
struct LeakySigner;

#[async_trait]
impl TransactionSender for LeakySigner {
    async fn send_transaction(&self, _call: ContractCall) -> Result<TxHash, ChainFailure> {
        Err(ChainFailure::Transport(format!(
            "signing with 0x{OPERATOR_KEY_HEX} failed"
        )))
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt, ChainFailure> {
        Err(ChainFailure::Transport(format!("unknown transaction {hash}")))
    }
}

#[tokio::test]
async fn test_operator_key_never_reaches_the_caller() {
    let network = SimulatedNetwork::new(testnet());
    network.mint(BASE_SEPOLIA, PAYER, 5_020_000).await;
    let finalizer = Finalizer::OperatorRelayed {
        signer: Arc::new(LeakySigner),
        key: OperatorKey::from_hex(OPERATOR_KEY_HEX).unwrap(),
    };
    let engine = engine(&network, finalizer);
    let wallet = SimulatedWallet::connected(network.clone(), PAYER, BASE_SEPOLIA);
    let recorder = RecordingObserver::new();

    let err = engine
        .execute_payment(&wallet, &request("ORD-1", 5_000_000), observers(&recorder))
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::FinalizationError(_)));
    let text = err.to_string();
    assert!(!text.contains(OPERATOR_KEY_HEX));
    assert!(text.contains("[REDACTED]"));
    let last = recorder.transitions().pop().unwrap();
    assert!(!last.message.contains(OPERATOR_KEY_HEX));
    assert!(!format!("{err:?}").contains(OPERATOR_KEY_HEX));
}
