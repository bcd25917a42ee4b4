use crate::domain::state::PaymentStatus;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum PaymentError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("User rejected request: {0}")]
    UserRejection(String),
    #[error("{step} transaction failed: {}", reason.as_deref().unwrap_or("no reason reported"))]
    ChainError {
        step: &'static str,
        reason: Option<String>,
    },
    #[error("Attestation timeout - no complete attestation after {attempts} attempts")]
    #[diagnostic(help("the lock is on-chain; query the attestation service again before retrying"))]
    AttestationTimeout { attempts: u32 },
    #[error("Finalization failed: {0}")]
    FinalizationError(String),
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },
    #[error("Config error: {0}")]
    #[diagnostic(code(nexuspay::config))]
    ConfigError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PaymentError {
    /// Whether the failure happened before anything was signed, so the same
    /// request can be corrected and resubmitted without checking chain state.
    pub fn is_pre_signing(&self) -> bool {
        matches!(
            self,
            PaymentError::ValidationError(_) | PaymentError::ConfigError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_error_includes_reason() {
        let err = PaymentError::ChainError {
            step: "pay",
            reason: Some("ERC20: insufficient allowance".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "pay transaction failed: ERC20: insufficient allowance"
        );

        let err = PaymentError::ChainError {
            step: "approve",
            reason: None,
        };
        assert_eq!(
            err.to_string(),
            "approve transaction failed: no reason reported"
        );
    }

    #[test]
    fn test_timeout_message_is_verbatim() {
        let err = PaymentError::AttestationTimeout { attempts: 20 };
        assert!(err.to_string().contains("after 20 attempts"));
        assert!(!err.is_pre_signing());
    }
}
