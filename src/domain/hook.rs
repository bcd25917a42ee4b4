//! Settlement metadata carried alongside the cross-chain message.
//!
//! The destination vault reads this payload to decide which merchant and order
//! the arriving funds belong to, so the two shapes below must stay byte-exact:
//!
//! * `abi.encode(address merchant, string orderId)`
//! * `abi.encode(address merchant, string orderId, uint256 campaignId, address referrer)`

use super::payment::{OrderId, Referral};
use crate::error::{PaymentError, Result};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolValue;

/// Offset of the `orderId` tail in the two-field encoding.
const BASE_STRING_OFFSET: u64 = 0x40;
/// Offset of the `orderId` tail when referral fields are present.
const REFERRAL_STRING_OFFSET: u64 = 0x80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookMetadata {
    pub merchant: Address,
    pub order_id: String,
    pub referral: Option<(u64, Address)>,
}

impl HookMetadata {
    pub fn new(merchant: Address, order_id: &OrderId, referral: &Referral) -> Self {
        Self {
            merchant,
            order_id: order_id.as_str().to_string(),
            referral: referral.qualified(),
        }
    }

    pub fn encode(&self) -> Bytes {
        let encoded = match self.referral {
            Some((campaign_id, referrer)) => (
                self.merchant,
                self.order_id.clone(),
                U256::from(campaign_id),
                referrer,
            )
                .abi_encode_params(),
            None => (self.merchant, self.order_id.clone()).abi_encode_params(),
        };
        Bytes::from(encoded)
    }

    /// Decodes either shape, telling them apart by the string offset in the second head word.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 64 {
            return Err(PaymentError::ValidationError(format!(
                "Hook data too short: {} bytes",
                data.len()
            )));
        }
        let offset = U256::from_be_slice(&data[32..64]);

        if offset == U256::from(REFERRAL_STRING_OFFSET) {
            let (merchant, order_id, campaign_id, referrer) =
                <(Address, String, U256, Address)>::abi_decode_params(data, true)
                    .map_err(|e| PaymentError::ValidationError(format!("Invalid hook data: {e}")))?;
            let campaign_id = u64::try_from(campaign_id).map_err(|_| {
                PaymentError::ValidationError("Campaign id out of range".to_string())
            })?;
            Ok(Self {
                merchant,
                order_id,
                referral: Some((campaign_id, referrer)),
            })
        } else if offset == U256::from(BASE_STRING_OFFSET) {
            let (merchant, order_id) = <(Address, String)>::abi_decode_params(data, true)
                .map_err(|e| PaymentError::ValidationError(format!("Invalid hook data: {e}")))?;
            Ok(Self {
                merchant,
                order_id,
                referral: None,
            })
        } else {
            Err(PaymentError::ValidationError(format!(
                "Unrecognized hook data layout (string offset {offset})"
            )))
        }
    }
}

/// Builds the hook payload for a payment.
pub fn encode_hook_data(merchant: Address, order_id: &OrderId, referral: &Referral) -> Bytes {
    HookMetadata::new(merchant, order_id, referral).encode()
}
