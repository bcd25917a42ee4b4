//! Payment progress states and the observer contract the UI layer consumes.

use crate::error::{PaymentError, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Idle,
    Approving,
    /// Bridged route: lock/burn on the source chain.
    Locking,
    /// Direct route: `pay` submitted to the settlement ledger.
    Paying,
    /// Bridged route: waiting for the attestation service.
    Attesting,
    /// Settlement-side completion (finalize call, or the pay receipt on the direct route).
    Finalizing,
    Success,
    Error,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Success | PaymentStatus::Error)
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;

        if next == Error {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Idle, Approving)
                | (Approving, Locking)
                | (Approving, Paying)
                | (Locking, Attesting)
                | (Attesting, Finalizing)
                | (Paying, Finalizing)
                | (Finalizing, Success)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentStatus::Idle => "idle",
            PaymentStatus::Approving => "approving",
            PaymentStatus::Locking => "locking",
            PaymentStatus::Paying => "paying",
            PaymentStatus::Attesting => "attesting",
            PaymentStatus::Finalizing => "finalizing",
            PaymentStatus::Success => "success",
            PaymentStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// One state change, with the progress message shown for the step being entered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    pub message: String,
    pub at: SystemTime,
}

/// Receives every transition of an attempt, synchronously and in order.
pub trait StatusObserver: Send + Sync {
    fn on_transition(&self, transition: &Transition);
}

/// Forwards transitions into an unbounded channel for a single consumer.
///
/// A dropped receiver is the caller's way of no longer watching; the attempt
/// keeps running and sends are silently discarded.
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<Transition>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Transition>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl StatusObserver for ChannelObserver {
    fn on_transition(&self, transition: &Transition) {
        let _ = self.sender.send(transition.clone());
    }
}

/// Logs each transition through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl StatusObserver for LoggingObserver {
    fn on_transition(&self, transition: &Transition) {
        match transition.to {
            PaymentStatus::Error => {
                tracing::warn!(from = %transition.from, "{}", transition.message)
            }
            _ => tracing::info!(status = %transition.to, "{}", transition.message),
        }
    }
}

/// Tracks the status of a single attempt and fans transitions out to observers.
pub struct PaymentStateMachine {
    status: PaymentStatus,
    observers: Vec<Arc<dyn StatusObserver>>,
    history: Vec<Transition>,
}

impl Default for PaymentStateMachine {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PaymentStateMachine {
    pub fn new(observers: Vec<Arc<dyn StatusObserver>>) -> Self {
        Self {
            status: PaymentStatus::Idle,
            observers,
            history: Vec::new(),
        }
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    /// Moves to `next` and notifies every observer before returning.
    pub fn advance(&mut self, next: PaymentStatus, message: impl Into<String>) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(PaymentError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        let transition = Transition {
            from: self.status,
            to: next,
            message: message.into(),
            at: SystemTime::now(),
        };
        self.status = next;
        for observer in &self.observers {
            observer.on_transition(&transition);
        }
        self.history.push(transition);
        Ok(())
    }

    /// Records a terminal failure. A machine already in a terminal state is left untouched.
    pub fn fail(&mut self, error: &PaymentError) {
        if self.status.is_terminal() {
            return;
        }
        let _ = self.advance(PaymentStatus::Error, error.to_string());
    }
}
