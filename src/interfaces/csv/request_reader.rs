use serde::Deserialize;
use std::io::Read;

use crate::domain::refund::{RefundPayload, RefundRequest};
use crate::error::{RefundError, Rejection};

/// One CSV row describing a refund request. `item_ids` holds a
/// semicolon-separated list; the `idempotency_key` column is the
/// out-of-band channel for the key, mirroring a dedicated header.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestRow {
    pub transaction_id: String,
    pub item_ids: Option<String>,
    pub operator_id: String,
    pub reason: String,
    pub idempotency_key: Option<String>,
}

impl RequestRow {
    pub fn into_request(self) -> Result<RefundRequest, Rejection> {
        let item_ids = self.item_ids.filter(|raw| !raw.is_empty()).map(|raw| {
            raw.split(';')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect::<Vec<String>>()
        });

        let payload = RefundPayload {
            transaction_id: self.transaction_id,
            item_ids,
            operator_id: self.operator_id,
            reason: self.reason,
        };
        RefundRequest::new(payload, self.idempotency_key.filter(|key| !key.is_empty()))
    }
}

pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn requests(self) -> impl Iterator<Item = Result<RequestRow, RefundError>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(RefundError::from))
    }
}
