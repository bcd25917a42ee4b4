use crate::config::PollProfile;
use crate::domain::attestation::AttestationRecord;
use crate::domain::chain::Domain;
use crate::domain::ports::AttestationServiceRef;
use crate::error::{PaymentError, Result};
use alloy_primitives::TxHash;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bounded, fixed-interval polling schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(PaymentError::ConfigError(
                "attestation polling needs at least one attempt".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            interval,
        })
    }

    pub const fn short() -> Self {
        Self {
            max_attempts: 20,
            interval: Duration::from_secs(3),
        }
    }

    pub const fn long() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(20),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl From<PollProfile> for PollPolicy {
    fn from(profile: PollProfile) -> Self {
        match profile {
            PollProfile::Short => Self::short(),
            PollProfile::Long => Self::long(),
        }
    }
}

/// Waits for the attestation service to sign off on a lock transaction.
pub struct AttestationClient {
    service: AttestationServiceRef,
    policy: PollPolicy,
}

impl AttestationClient {
    pub fn new(service: AttestationServiceRef, policy: PollPolicy) -> Self {
        Self { service, policy }
    }

    /// Polls until a complete record arrives or the attempts run out.
    ///
    /// Failed queries count as attempts. There is no sleep after the last one.
    pub async fn await_attestation(
        &self,
        source_domain: Domain,
        tx_hash: TxHash,
    ) -> Result<AttestationRecord> {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            match self.service.fetch(source_domain, tx_hash).await {
                Ok(Some(raw)) => {
                    if let Some(record) = AttestationRecord::from_message(source_domain, &raw) {
                        info!(attempt, domain = %source_domain, tx = %tx_hash, "Attestation received");
                        return Ok(record);
                    }
                    debug!(attempt, status = %raw.status, "Attestation not ready");
                }
                Ok(None) => debug!(attempt, "Attestation not indexed yet"),
                Err(e) => warn!(attempt, error = %e, "Attestation query failed"),
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.policy.interval).await;
            }
        }

        Err(PaymentError::AttestationTimeout {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles() {
        assert_eq!(PollPolicy::from(PollProfile::Short).max_attempts(), 20);
        assert_eq!(
            PollPolicy::from(PollProfile::Short).interval(),
            Duration::from_secs(3)
        );
        assert_eq!(PollPolicy::long().max_attempts(), 60);
        assert_eq!(PollPolicy::long().interval(), Duration::from_secs(20));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert!(PollPolicy::new(0, Duration::from_secs(1)).is_err());
        assert!(PollPolicy::new(1, Duration::ZERO).is_ok());
    }
}
