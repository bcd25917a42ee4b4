#![allow(dead_code)]

use alloy_primitives::{Address, address};
use nexuspay::application::engine::PaymentEngine;
use nexuspay::application::finalizer::Finalizer;
use nexuspay::config::DeploymentConfig;
use nexuspay::domain::amount::Amount;
use nexuspay::domain::chain::ChainId;
use nexuspay::domain::contract::ContractCall;
use nexuspay::domain::payment::{OrderId, PaymentRequest};
use nexuspay::domain::state::{PaymentStatus, StatusObserver, Transition};
use nexuspay::infrastructure::in_memory::{RecordedCall, SimulatedNetwork};
use std::sync::{Arc, Mutex};

pub const MERCHANT: Address = address!("0x1111111111111111111111111111111111111111");
pub const REFERRER: Address = address!("0x2222222222222222222222222222222222222222");
pub const PAYER: Address = address!("0x9999999999999999999999999999999999999999");
pub const SECOND_PAYER: Address = address!("0x8888888888888888888888888888888888888888");

pub const ARC_TESTNET: ChainId = ChainId(5_042_002);
pub const BASE_SEPOLIA: ChainId = ChainId(84_532);

pub const OPERATOR_KEY_HEX: &str =
    "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

pub fn request(order_id: &str, units: u64) -> PaymentRequest {
    PaymentRequest::new(
        MERCHANT,
        OrderId::new(order_id).unwrap(),
        Amount::new(units).unwrap(),
    )
}

pub fn engine(network: &SimulatedNetwork, finalizer: Finalizer) -> PaymentEngine {
    PaymentEngine::new(
        network.config().clone(),
        Arc::new(network.clone()),
        finalizer,
    )
    .unwrap()
}

/// Captures every transition for later assertions.
#[derive(Default)]
pub struct RecordingObserver {
    transitions: Mutex<Vec<Transition>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn transitions(&self) -> Vec<Transition> {
        self.transitions.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<PaymentStatus> {
        self.transitions().iter().map(|t| t.to).collect()
    }
}

impl StatusObserver for RecordingObserver {
    fn on_transition(&self, transition: &Transition) {
        self.transitions.lock().unwrap().push(transition.clone());
    }
}

pub fn observers(recorder: &Arc<RecordingObserver>) -> Vec<Arc<dyn StatusObserver>> {
    vec![recorder.clone()]
}

pub fn calls_for_step(calls: &[RecordedCall], step: &str) -> Vec<ContractCall> {
    calls
        .iter()
        .filter(|c| c.call.step() == step)
        .map(|c| c.call.clone())
        .collect()
}

pub fn testnet() -> DeploymentConfig {
    DeploymentConfig::testnet()
}
