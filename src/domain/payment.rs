use super::amount::Amount;
use super::chain::ChainDeployment;
use super::state::{PaymentStateMachine, PaymentStatus, StatusObserver, Transition};
use crate::error::{PaymentError, Result};
use alloy_primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Caller-supplied order identifier.
///
/// The settlement ledger uses it as the idempotency key when crediting the merchant,
/// so it must be unique per attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderId(String);

impl OrderId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(PaymentError::ValidationError(
                "Order id must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OrderId {
    type Error = PaymentError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed price, or a payer-chosen amount with optional bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum AmountMode {
    Fixed,
    Variable {
        min: Option<Amount>,
        max: Option<Amount>,
    },
}

impl Default for AmountMode {
    fn default() -> Self {
        AmountMode::Variable {
            min: None,
            max: None,
        }
    }
}

impl AmountMode {
    pub fn bounds(&self) -> (Option<Amount>, Option<Amount>) {
        match self {
            AmountMode::Variable { min, max } => (*min, *max),
            AmountMode::Fixed => (None, None),
        }
    }
}

/// Optional referral attribution carried in the hook metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Referral {
    pub campaign_id: Option<u64>,
    pub referrer: Option<Address>,
}

impl Referral {
    pub fn new(campaign_id: u64, referrer: Address) -> Self {
        Self {
            campaign_id: Some(campaign_id),
            referrer: Some(referrer),
        }
    }

    /// Returns the pair only when a positive campaign id and a non-zero referrer are both present.
    pub fn qualified(&self) -> Option<(u64, Address)> {
        match (self.campaign_id, self.referrer) {
            (Some(campaign), Some(referrer)) if campaign > 0 && referrer != Address::ZERO => {
                Some((campaign, referrer))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub merchant: Address,
    pub order_id: OrderId,
    pub amount: Amount,
    #[serde(default)]
    pub mode: AmountMode,
    #[serde(default)]
    pub referral: Referral,
}

impl PaymentRequest {
    pub fn new(merchant: Address, order_id: OrderId, amount: Amount) -> Self {
        Self {
            merchant,
            order_id,
            amount,
            mode: AmountMode::default(),
            referral: Referral::default(),
        }
    }

    pub fn with_mode(mut self, mode: AmountMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_referral(mut self, referral: Referral) -> Self {
        self.referral = referral;
        self
    }

    /// Checks the amount against the mode's bounds.
    pub fn validate(&self) -> Result<()> {
        if self.merchant == Address::ZERO {
            return Err(PaymentError::ValidationError(
                "Merchant address must not be the zero address".to_string(),
            ));
        }

        let (min, max) = self.mode.bounds();
        if let (Some(min), Some(max)) = (min, max)
            && min > max
        {
            return Err(PaymentError::ValidationError(format!(
                "Minimum {min} exceeds maximum {max}"
            )));
        }
        if let Some(min) = min
            && self.amount < min
        {
            return Err(PaymentError::ValidationError(format!(
                "Amount must be at least {min}"
            )));
        }
        if let Some(max) = max
            && self.amount > max
        {
            return Err(PaymentError::ValidationError(format!(
                "Amount must not exceed {max}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Direct,
    Bridged,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteKind::Direct => f.write_str("direct"),
            RouteKind::Bridged => f.write_str("bridged"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Payer is already on the settlement chain.
    Direct,
    /// Payer must lock on `source` and finalize on the settlement chain.
    Bridged { source: ChainDeployment },
}

impl Route {
    pub fn kind(&self) -> RouteKind {
        match self {
            Route::Direct => RouteKind::Direct,
            Route::Bridged { .. } => RouteKind::Bridged,
        }
    }
}

/// Transaction references and amounts of a completed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementResult {
    pub order_id: OrderId,
    pub route: RouteKind,
    pub amount: Amount,
    pub fee: u64,
    /// Source-chain lock transaction; bridged route only.
    pub lock_tx: Option<TxHash>,
    /// `pay` transaction on the direct route, finalize transaction on the bridged route.
    pub settlement_tx: TxHash,
}

/// One execution of a [`PaymentRequest`]. Never persisted; a retry is a new attempt.
pub struct PaymentAttempt {
    order_id: OrderId,
    route: Option<RouteKind>,
    fee: u64,
    machine: PaymentStateMachine,
}

impl PaymentAttempt {
    pub fn new(order_id: OrderId, observers: Vec<Arc<dyn StatusObserver>>) -> Self {
        Self {
            order_id,
            route: None,
            fee: 0,
            machine: PaymentStateMachine::new(observers),
        }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn route(&self) -> Option<RouteKind> {
        self.route
    }

    pub fn set_route(&mut self, route: RouteKind) {
        self.route = Some(route);
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    pub fn set_fee(&mut self, fee: u64) {
        self.fee = fee;
    }

    pub fn status(&self) -> PaymentStatus {
        self.machine.status()
    }

    pub fn transitions(&self) -> &[Transition] {
        self.machine.history()
    }

    pub fn advance(&mut self, next: PaymentStatus, message: impl Into<String>) -> Result<()> {
        self.machine.advance(next, message)
    }

    pub fn fail(&mut self, error: &PaymentError) {
        self.machine.fail(error)
    }
}
