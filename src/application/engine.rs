use super::attestation::{AttestationClient, PollPolicy};
use super::bridge::BridgeOrchestrator;
use super::direct::DirectSettlement;
use super::finalizer::Finalizer;
use super::router::ChainRouter;
use crate::config::DeploymentConfig;
use crate::domain::payment::{PaymentAttempt, PaymentRequest, Route, SettlementResult};
use crate::domain::ports::{AttestationServiceRef, Wallet};
use crate::domain::state::StatusObserver;
use crate::error::Result;
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};

/// The main entry point for executing payments.
///
/// `PaymentEngine` owns the routing, settlement flows and attestation polling for one
/// deployment. It holds no per-payment state: each call to [`execute_payment`] creates a
/// fresh [`PaymentAttempt`] that is dropped once the terminal transition is delivered, so
/// one engine can run any number of payments concurrently.
///
/// [`execute_payment`]: PaymentEngine::execute_payment
pub struct PaymentEngine {
    config: Arc<DeploymentConfig>,
    router: ChainRouter,
    direct: DirectSettlement,
    bridge: BridgeOrchestrator,
}

impl PaymentEngine {
    /// Creates a new `PaymentEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `config` - Deployment to settle against; validated here.
    /// * `attestation_service` - Source of attestations for bridged payments.
    /// * `finalizer` - Who submits the settlement-side finalize call.
    pub fn new(
        config: DeploymentConfig,
        attestation_service: AttestationServiceRef,
        finalizer: Finalizer,
    ) -> Result<Self> {
        let policy = PollPolicy::from(config.attestation.poll);
        Self::with_poll_policy(config, attestation_service, finalizer, policy)
    }

    pub fn with_poll_policy(
        config: DeploymentConfig,
        attestation_service: AttestationServiceRef,
        finalizer: Finalizer,
        policy: PollPolicy,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            settlement = %config.settlement_chain,
            finalizer = ?finalizer.kind(),
            "Payment engine ready"
        );
        let config = Arc::new(config);
        let attestations = AttestationClient::new(attestation_service, policy);

        Ok(Self {
            router: ChainRouter::new(config.clone()),
            direct: DirectSettlement::new(config.vault),
            bridge: BridgeOrchestrator::new(config.clone(), attestations, finalizer),
            config,
        })
    }

    pub fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    /// Runs one payment to a terminal state.
    ///
    /// Every transition, including the final `Success` or `Error`, reaches all
    /// `observers` before this returns. Dropping the future abandons the attempt
    /// without touching anything already submitted.
    pub async fn execute_payment<W>(
        &self,
        wallet: &W,
        request: &PaymentRequest,
        observers: Vec<Arc<dyn StatusObserver>>,
    ) -> Result<SettlementResult>
    where
        W: Wallet + ?Sized,
    {
        let span = info_span!("payment", order_id = %request.order_id);
        async move {
            let mut attempt = PaymentAttempt::new(request.order_id.clone(), observers);

            let outcome = self.run(wallet, request, &mut attempt).await;
            match &outcome {
                Ok(result) => info!(
                    route = %result.route,
                    fee = result.fee,
                    tx = %result.settlement_tx,
                    "Payment settled"
                ),
                Err(e) => {
                    attempt.fail(e);
                    warn!(status = %attempt.status(), error = %e, "Payment failed");
                }
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run<W>(
        &self,
        wallet: &W,
        request: &PaymentRequest,
        attempt: &mut PaymentAttempt,
    ) -> Result<SettlementResult>
    where
        W: Wallet + ?Sized,
    {
        let route = self.router.route(wallet.chain_id(), request)?;
        attempt.set_route(route.kind());
        info!(route = %route.kind(), amount = %request.amount, "Route selected");

        let settlement = self.config.settlement()?;
        match route {
            Route::Direct => {
                self.direct
                    .execute(wallet, settlement, request, attempt)
                    .await
            }
            Route::Bridged { source } => {
                self.bridge
                    .execute(wallet, &source, settlement, request, attempt)
                    .await
            }
        }
    }
}
