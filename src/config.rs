//! Deployment configuration and the operator signing key.

use crate::domain::chain::{ChainDeployment, ChainId, Domain};
use crate::error::{PaymentError, Result};
use alloy_primitives::{Address, address};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

pub const OPERATOR_KEY_ENV: &str = "NEXUSPAY_OPERATOR_KEY";
pub const ATTESTATION_URL_ENV: &str = "NEXUSPAY_ATTESTATION_URL";

const DEFAULT_MIN_FINALITY_THRESHOLD: u32 = 1000;
const TESTNET_PROTOCOL_FEE: u64 = 20_000;

/// How the bridged route accounts for the protocol fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum FeePolicy {
    /// No fee; the locked amount equals the payment amount.
    Waived,
    /// A fixed fee in base units added on top of the payment amount.
    Charged { amount: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizerKind {
    /// The payer's wallet switches to the settlement chain and submits the finalize call.
    #[default]
    UserSigned,
    /// A process-wide operator key submits the finalize call.
    OperatorRelayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollProfile {
    /// 20 attempts, 3 seconds apart.
    #[default]
    Short,
    /// 60 attempts, 20 seconds apart.
    Long,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationConfig {
    pub api_url: String,
    #[serde(default)]
    pub poll: PollProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub settlement_chain: ChainId,
    /// Settlement ledger: `pay` target and bridged mint recipient.
    pub vault: Address,
    #[serde(default)]
    pub finalizer: FinalizerKind,
    pub fee: FeePolicy,
    #[serde(default = "default_min_finality_threshold")]
    pub min_finality_threshold: u32,
    /// Only this address may finalize; zero lets anyone relay.
    #[serde(default)]
    pub destination_caller: Address,
    pub attestation: AttestationConfig,
    pub chains: Vec<ChainDeployment>,
}

fn default_min_finality_threshold() -> u32 {
    DEFAULT_MIN_FINALITY_THRESHOLD
}

impl DeploymentConfig {
    /// Loads and validates a TOML deployment file.
    ///
    /// `NEXUSPAY_ATTESTATION_URL`, when set and non-empty, overrides `attestation.api_url`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&raw)?;
        if let Ok(url) = std::env::var(ATTESTATION_URL_ENV)
            && !url.trim().is_empty()
        {
            config.attestation.api_url = url;
            config.validate()?;
        }
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: DeploymentConfig = toml::from_str(raw)
            .map_err(|e| PaymentError::ConfigError(format!("failed parsing config toml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vault == Address::ZERO {
            return Err(PaymentError::ConfigError(
                "vault must not be the zero address".to_string(),
            ));
        }
        if let FeePolicy::Charged { amount: 0 } = self.fee {
            return Err(PaymentError::ConfigError(
                "charged fee policy needs a positive amount; use the waived policy instead"
                    .to_string(),
            ));
        }
        if self.min_finality_threshold == 0 {
            return Err(PaymentError::ConfigError(
                "min_finality_threshold must be > 0".to_string(),
            ));
        }
        reqwest::Url::parse(&self.attestation.api_url).map_err(|e| {
            PaymentError::ConfigError(format!(
                "invalid attestation api_url '{}': {e}",
                self.attestation.api_url
            ))
        })?;

        let mut chain_ids = HashSet::new();
        let mut domains = HashSet::new();
        for chain in &self.chains {
            if !chain_ids.insert(chain.chain_id) {
                return Err(PaymentError::ConfigError(format!(
                    "chain {} is configured more than once",
                    chain.chain_id
                )));
            }
            if !domains.insert(chain.domain) {
                return Err(PaymentError::ConfigError(format!(
                    "domain {} is used by more than one chain",
                    chain.domain
                )));
            }
        }
        self.settlement()?;
        Ok(())
    }

    pub fn settlement(&self) -> Result<&ChainDeployment> {
        self.chain(self.settlement_chain).ok_or_else(|| {
            PaymentError::ConfigError(format!(
                "settlement chain {} has no deployment",
                self.settlement_chain
            ))
        })
    }

    pub fn chain(&self, chain_id: ChainId) -> Option<&ChainDeployment> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    /// Supported source chains, i.e. every deployment except the settlement chain.
    pub fn sources(&self) -> impl Iterator<Item = &ChainDeployment> {
        self.chains
            .iter()
            .filter(move |c| c.chain_id != self.settlement_chain)
    }

    /// Circle sandbox deployment: Arc testnet settlement, three Sepolia-family sources.
    pub fn testnet() -> Self {
        let bridge = address!("0x8FE6B999Dc680CcFDD5Bf7EB0974218be2542DAA");
        let message_transmitter = address!("0xE737e5cEBEEBa77EFE34D4aa090756590b1CE275");
        let chain = |chain_id: u64, name: &str, domain: u32, token: Address| ChainDeployment {
            chain_id: ChainId(chain_id),
            name: name.to_string(),
            domain: Domain(domain),
            token,
            bridge,
            message_transmitter,
        };

        Self {
            settlement_chain: ChainId(5_042_002),
            vault: address!("0xfC159e07f19aCd1d17575febCB285175206FB792"),
            finalizer: FinalizerKind::UserSigned,
            fee: FeePolicy::Charged {
                amount: TESTNET_PROTOCOL_FEE,
            },
            min_finality_threshold: DEFAULT_MIN_FINALITY_THRESHOLD,
            destination_caller: Address::ZERO,
            attestation: AttestationConfig {
                api_url: "https://iris-api-sandbox.circle.com".to_string(),
                poll: PollProfile::Short,
            },
            chains: vec![
                chain(
                    5_042_002,
                    "Arc Testnet",
                    26,
                    address!("0x3600000000000000000000000000000000000000"),
                ),
                chain(
                    11_155_111,
                    "Ethereum Sepolia",
                    0,
                    address!("0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
                ),
                chain(
                    84_532,
                    "Base Sepolia",
                    6,
                    address!("0x036CbD53842c5426634e7929541eC2318f3dCF7e"),
                ),
                chain(
                    421_614,
                    "Arbitrum Sepolia",
                    3,
                    address!("0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d"),
                ),
            ],
        }
    }
}

/// Secp256k1 secret of the relaying operator. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct OperatorKey([u8; 32]);

impl OperatorKey {
    /// Parses 32 bytes of hex, with or without a `0x` prefix.
    ///
    /// Errors never echo the input.
    pub fn from_hex(value: &str) -> Result<Self> {
        let digits = value.trim();
        let digits = digits.strip_prefix("0x").unwrap_or(digits);
        let mut decoded = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(digits, &mut decoded[..]).map_err(|_| {
            PaymentError::ConfigError("operator key must be 32 bytes of hex".to_string())
        })?;
        if decoded.iter().all(|b| *b == 0) {
            return Err(PaymentError::ConfigError(
                "operator key must not be zero".to_string(),
            ));
        }
        Ok(Self(*decoded))
    }

    /// Reads the key from `NEXUSPAY_OPERATOR_KEY`; `Ok(None)` when unset.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var(OPERATOR_KEY_ENV) {
            Ok(value) => {
                let value = Zeroizing::new(value);
                Self::from_hex(&value).map(Some)
            }
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(PaymentError::ConfigError(format!(
                "{OPERATOR_KEY_ENV} is not valid unicode"
            ))),
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Replaces every occurrence of the key's hex form in `text`, in any letter case.
    pub fn redact(&self, text: &str) -> String {
        let needle = Zeroizing::new(hex::encode(self.0));
        let haystack = Zeroizing::new(text.to_ascii_lowercase());

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        while let Some(found) = haystack[cursor..].find(needle.as_str()) {
            let start = cursor + found;
            out.push_str(&text[cursor..start]);
            out.push_str("[REDACTED]");
            cursor = start + needle.len();
        }
        out.push_str(&text[cursor..]);
        out
    }
}

impl fmt::Debug for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OperatorKey([REDACTED])")
    }
}
