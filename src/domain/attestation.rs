use super::chain::Domain;
use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};

/// Raw status string the attestation service uses for a finished record.
pub const STATUS_COMPLETE: &str = "complete";

/// Marker the service puts in place of bytes that are not signed yet.
const PENDING_SENTINEL: &str = "PENDING";

/// One message entry as returned by the attestation service, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationMessage {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub attestation: Option<String>,
}

impl AttestationMessage {
    pub fn pending() -> Self {
        Self {
            status: "pending_confirmations".to_string(),
            message: Some("0x".to_string()),
            attestation: Some(PENDING_SENTINEL.to_string()),
        }
    }

    pub fn complete(message: &[u8], attestation: &[u8]) -> Self {
        Self {
            status: STATUS_COMPLETE.to_string(),
            message: Some(format!("0x{}", hex::encode(message))),
            attestation: Some(format!("0x{}", hex::encode(attestation))),
        }
    }
}

/// Proof that a lock event is final, ready to be handed to the finalize entrypoint.
///
/// Only obtainable through [`AttestationRecord::from_message`], which refuses anything
/// that is not explicitly complete with two non-empty, well-formed hex payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationRecord {
    message: Bytes,
    attestation: Bytes,
    source_domain: Domain,
}

impl AttestationRecord {
    pub fn from_message(source_domain: Domain, raw: &AttestationMessage) -> Option<Self> {
        if raw.status != STATUS_COMPLETE {
            return None;
        }
        let message = decode_payload(raw.message.as_deref()?)?;
        let attestation = decode_payload(raw.attestation.as_deref()?)?;
        Some(Self {
            message,
            attestation,
            source_domain,
        })
    }

    pub fn message(&self) -> &Bytes {
        &self.message
    }

    pub fn attestation(&self) -> &Bytes {
        &self.attestation
    }

    pub fn source_domain(&self) -> Domain {
        self.source_domain
    }
}

fn decode_payload(value: &str) -> Option<Bytes> {
    if value.contains(PENDING_SENTINEL) {
        return None;
    }
    let digits = value.strip_prefix("0x")?;
    if digits.is_empty() {
        return None;
    }
    hex::decode(digits).ok().map(Bytes::from)
}
