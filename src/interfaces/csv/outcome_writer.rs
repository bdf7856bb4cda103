use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

use crate::application::service::RefundOutcome;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct OutcomeRow {
    refund_id: String,
    transaction_id: String,
    status: String,
    total_refund: Decimal,
    currency: String,
    replayed: bool,
}

impl From<&RefundOutcome> for OutcomeRow {
    fn from(outcome: &RefundOutcome) -> Self {
        Self {
            refund_id: outcome.result.refund_id.clone(),
            transaction_id: outcome.result.transaction_id.clone(),
            status: outcome.result.status.as_str().to_string(),
            total_refund: outcome.result.total_refund_amount,
            currency: outcome.result.currency.clone(),
            replayed: outcome.replayed,
        }
    }
}

pub struct OutcomeWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_outcome(&mut self, outcome: &RefundOutcome) -> Result<()> {
        self.writer.serialize(OutcomeRow::from(outcome))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
