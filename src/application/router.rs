use crate::config::DeploymentConfig;
use crate::domain::chain::ChainId;
use crate::domain::payment::{PaymentRequest, Route};
use crate::error::{PaymentError, Result};
use std::sync::Arc;

/// Picks the settlement flow for a request based on the payer's connected chain.
///
/// All checks run before anything is signed, so a rejected request never leaves `Idle`
/// except to `Error`.
#[derive(Debug, Clone)]
pub struct ChainRouter {
    config: Arc<DeploymentConfig>,
}

impl ChainRouter {
    pub fn new(config: Arc<DeploymentConfig>) -> Self {
        Self { config }
    }

    pub fn route(&self, connected: Option<ChainId>, request: &PaymentRequest) -> Result<Route> {
        let chain_id = connected.ok_or_else(|| {
            PaymentError::ValidationError("Please connect your wallet".to_string())
        })?;
        request.validate()?;

        if chain_id == self.config.settlement_chain {
            return Ok(Route::Direct);
        }

        let source = self
            .config
            .sources()
            .find(|c| c.chain_id == chain_id)
            .ok_or_else(|| PaymentError::ValidationError(format!("Unsupported chain {chain_id}")))?;
        Ok(Route::Bridged {
            source: source.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::amount::Amount;
    use crate::domain::payment::{AmountMode, OrderId, RouteKind};
    use alloy_primitives::address;

    fn router() -> ChainRouter {
        ChainRouter::new(Arc::new(DeploymentConfig::testnet()))
    }

    fn request() -> PaymentRequest {
        PaymentRequest::new(
            address!("0x1111111111111111111111111111111111111111"),
            OrderId::new("ORD-1").unwrap(),
            Amount::new(5_000_000).unwrap(),
        )
    }

    #[test]
    fn test_settlement_chain_routes_direct() {
        let route = router().route(Some(ChainId(5_042_002)), &request()).unwrap();
        assert_eq!(route, Route::Direct);
    }

    #[test]
    fn test_source_chain_routes_bridged() {
        let route = router().route(Some(ChainId(84_532)), &request()).unwrap();
        assert_eq!(route.kind(), RouteKind::Bridged);
        match route {
            Route::Bridged { source } => assert_eq!(source.name, "Base Sepolia"),
            Route::Direct => panic!("expected bridged route"),
        }
    }

    #[test]
    fn test_disconnected_wallet_rejected() {
        let err = router().route(None, &request()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Please connect your wallet"
        );
    }

    #[test]
    fn test_unsupported_chain_rejected() {
        let err = router().route(Some(ChainId(1)), &request()).unwrap_err();
        assert!(err.to_string().contains("Unsupported chain 1"));
    }

    #[test]
    fn test_bounds_checked_before_routing() {
        let request = request().with_mode(AmountMode::Variable {
            min: Some(Amount::new(10_000_000).unwrap()),
            max: None,
        });
        let err = router()
            .route(Some(ChainId(5_042_002)), &request)
            .unwrap_err();
        assert!(err.is_pre_signing());
    }
}
