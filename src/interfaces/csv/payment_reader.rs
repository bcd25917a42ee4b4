use crate::domain::amount::Amount;
use crate::domain::chain::ChainId;
use crate::domain::payment::{OrderId, PaymentRequest, Referral};
use crate::error::{PaymentError, Result};
use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One CSV row: `merchant,order_id,amount,chain,campaign_id,referrer`.
#[derive(Debug, Deserialize)]
struct PaymentRow {
    merchant: Address,
    order_id: String,
    amount: Decimal,
    chain: u64,
    #[serde(default)]
    campaign_id: Option<u64>,
    #[serde(default)]
    referrer: Option<Address>,
}

/// A payment to run from the chain the payer's wallet is connected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPayment {
    pub chain_id: ChainId,
    pub request: PaymentRequest,
}

impl TryFrom<PaymentRow> for BatchPayment {
    type Error = PaymentError;

    fn try_from(row: PaymentRow) -> Result<Self> {
        let request = PaymentRequest::new(
            row.merchant,
            OrderId::new(row.order_id)?,
            Amount::from_decimal(row.amount)?,
        )
        .with_referral(Referral {
            campaign_id: row.campaign_id,
            referrer: row.referrer,
        });
        Ok(Self {
            chain_id: ChainId(row.chain),
            request,
        })
    }
}

/// Reads payment rows from a CSV source.
///
/// Wraps `csv::Reader`, trimming whitespace and accepting rows without the
/// trailing referral columns.
pub struct PaymentReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PaymentReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes and validates each row.
    pub fn payments(self) -> impl Iterator<Item = Result<BatchPayment>> {
        self.reader.into_deserialize::<PaymentRow>().map(|result| {
            result
                .map_err(PaymentError::from)
                .and_then(BatchPayment::try_from)
        })
    }
}
