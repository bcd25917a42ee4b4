//! Application layer orchestrating a payment from routing to settlement.
//!
//! `PaymentEngine` is the entry point. It routes each request to either the
//! same-chain `DirectSettlement` flow or the cross-chain `BridgeOrchestrator`,
//! and drives the attempt's state machine along the way.

pub mod attestation;
pub mod bridge;
pub mod direct;
pub mod engine;
pub mod fee;
pub mod finalizer;
pub mod router;
pub(crate) mod submission;
