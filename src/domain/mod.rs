//! Domain types: amounts, chains, payment requests, state and the ports to the outside world.

pub mod amount;
pub mod attestation;
pub mod chain;
pub mod contract;
pub mod hook;
pub mod payment;
pub mod ports;
pub mod state;
