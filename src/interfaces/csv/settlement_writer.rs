use crate::domain::payment::{OrderId, SettlementResult};
use crate::error::{PaymentError, Result};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct SettlementRow<'a> {
    order_id: &'a str,
    status: &'static str,
    route: String,
    amount: String,
    fee: u64,
    lock_tx: String,
    settlement_tx: String,
    error: String,
}

/// Writes one CSV row per executed payment, successful or not.
pub struct SettlementWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> SettlementWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_outcome(
        &mut self,
        order_id: &OrderId,
        outcome: &Result<SettlementResult>,
    ) -> Result<()> {
        let row = match outcome {
            Ok(result) => SettlementRow {
                order_id: order_id.as_str(),
                status: "success",
                route: result.route.to_string(),
                amount: result.amount.to_decimal().to_string(),
                fee: result.fee,
                lock_tx: result
                    .lock_tx
                    .map(|tx| format!("0x{}", hex::encode(tx)))
                    .unwrap_or_default(),
                settlement_tx: format!("0x{}", hex::encode(result.settlement_tx)),
                error: String::new(),
            },
            Err(e) => SettlementRow {
                order_id: order_id.as_str(),
                status: "error",
                route: String::new(),
                amount: String::new(),
                fee: 0,
                lock_tx: String::new(),
                settlement_tx: String::new(),
                error: e.to_string(),
            },
        };
        self.writer.serialize(row)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(PaymentError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::amount::Amount;
    use crate::domain::payment::RouteKind;
    use alloy_primitives::B256;

    #[test]
    fn test_writes_success_and_error_rows() {
        let order = OrderId::new("ORD-1").unwrap();
        let ok = Ok(SettlementResult {
            order_id: order.clone(),
            route: RouteKind::Bridged,
            amount: Amount::new(5_000_000).unwrap(),
            fee: 20_000,
            lock_tx: Some(B256::repeat_byte(0x11)),
            settlement_tx: B256::repeat_byte(0x22),
        });
        let failed = Err(PaymentError::AttestationTimeout { attempts: 20 });

        let mut buffer = Vec::new();
        {
            let mut writer = SettlementWriter::new(&mut buffer);
            writer.write_outcome(&order, &ok).unwrap();
            writer
                .write_outcome(&OrderId::new("ORD-2").unwrap(), &failed)
                .unwrap();
            writer.flush().unwrap();
        }
        let output = String::from_utf8(buffer).unwrap();

        assert!(output.starts_with(
            "order_id,status,route,amount,fee,lock_tx,settlement_tx,error\n"
        ));
        assert!(output.contains(&format!(
            "ORD-1,success,bridged,5,20000,0x{},0x{},",
            "11".repeat(32),
            "22".repeat(32)
        )));
        assert!(output.contains("ORD-2,error,,,0,,,Attestation timeout"));
    }
}
