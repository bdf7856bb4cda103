use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::breakdown::Breakdown;
use crate::domain::transaction::Transaction;
use crate::error::Rejection;

pub const MAX_ID_LEN: usize = 50;
pub const MAX_ITEM_IDS: usize = 100;
pub const MAX_REASON_LEN: usize = 500;
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 100;

/// The documented request payload. The idempotency key travels out-of-band
/// (a dedicated header or CSV column), so it is not a payload field and a
/// payload that smuggles one fails to deserialize.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefundPayload {
    pub transaction_id: String,
    #[serde(default)]
    pub item_ids: Option<Vec<String>>,
    pub operator_id: String,
    pub reason: String,
}

/// A bounds-checked refund request, ready for the business-rule validator.
#[derive(Debug, Clone, PartialEq)]
pub struct RefundRequest {
    pub transaction_id: String,
    pub item_ids: Option<Vec<String>>,
    pub operator_id: String,
    pub reason: String,
    pub idempotency_key: Option<String>,
}

impl RefundRequest {
    pub fn new(
        payload: RefundPayload,
        idempotency_key: Option<String>,
    ) -> std::result::Result<Self, Rejection> {
        require_len("transaction_id", &payload.transaction_id, 1, MAX_ID_LEN)?;
        require_entity_id("transaction_id", &payload.transaction_id)?;
        require_len("operator_id", &payload.operator_id, 1, MAX_ID_LEN)?;
        require_operator_id("operator_id", &payload.operator_id)?;
        require_len("reason", &payload.reason, 1, MAX_REASON_LEN)?;

        if let Some(item_ids) = &payload.item_ids {
            if item_ids.is_empty() {
                return Err(Rejection::invalid_request(
                    "item_ids",
                    "item_ids must not be empty when present",
                ));
            }
            if item_ids.len() > MAX_ITEM_IDS {
                return Err(Rejection::invalid_request(
                    "item_ids",
                    format!("item_ids must have at most {MAX_ITEM_IDS} entries"),
                ));
            }
            for item_id in item_ids {
                require_len("item_ids", item_id, 1, MAX_ID_LEN)?;
                require_entity_id("item_ids", item_id)?;
            }
        }

        if let Some(key) = &idempotency_key {
            require_len("idempotency_key", key, 1, MAX_IDEMPOTENCY_KEY_LEN)?;
        }

        Ok(Self {
            transaction_id: payload.transaction_id,
            item_ids: payload.item_ids,
            operator_id: payload.operator_id,
            reason: payload.reason,
            idempotency_key,
        })
    }
}

fn require_len(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> std::result::Result<(), Rejection> {
    if value.len() < min || value.len() > max {
        return Err(Rejection::invalid_request(
            field,
            format!("{field} must be between {min} and {max} characters"),
        ));
    }
    Ok(())
}

fn require_entity_id(field: &'static str, value: &str) -> std::result::Result<(), Rejection> {
    let ok = value
        .chars()
        .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_' || ch == '-');
    if !ok {
        return Err(Rejection::invalid_request(
            field,
            format!("{field} must contain only A-Z, 0-9, '_' or '-'"),
        ));
    }
    Ok(())
}

fn require_operator_id(field: &'static str, value: &str) -> std::result::Result<(), Rejection> {
    let ok = value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if !ok {
        return Err(Rejection::invalid_request(
            field,
            format!("{field} must contain only letters, digits, '_' or '-'"),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    Approved,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Approved => "APPROVED",
        }
    }
}

/// A persisted, approved refund. Created exactly once by the orchestrator
/// after validation and the final balance re-check; never updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundResult {
    pub refund_id: String,
    pub transaction_id: String,
    pub status: RefundStatus,
    pub total_refund_amount: Decimal,
    pub currency: String,
    pub operator_id: String,
    pub reason: String,
    pub calculation_breakdown: Breakdown,
    pub created_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
}

impl RefundResult {
    pub fn approved(transaction: &Transaction, request: &RefundRequest, breakdown: Breakdown) -> Self {
        Self {
            refund_id: new_refund_id(),
            transaction_id: transaction.id.clone(),
            status: RefundStatus::Approved,
            total_refund_amount: breakdown.total_refund(),
            currency: transaction.currency.clone(),
            operator_id: request.operator_id.clone(),
            reason: request.reason.clone(),
            calculation_breakdown: breakdown,
            created_at: Utc::now(),
            idempotency_key: request.idempotency_key.clone(),
        }
    }
}

fn new_refund_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("RF-{}", hex[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RejectCode;

    fn payload() -> RefundPayload {
        RefundPayload {
            transaction_id: "TXN-1".into(),
            item_ids: None,
            operator_id: "op-1".into(),
            reason: "customer returned the goods".into(),
        }
    }

    #[test]
    fn test_request_accepts_valid_payload() {
        let request = RefundRequest::new(payload(), Some("KEY-1".into())).unwrap();
        assert_eq!(request.transaction_id, "TXN-1");
        assert_eq!(request.idempotency_key.as_deref(), Some("KEY-1"));
    }

    #[test]
    fn test_request_rejects_empty_reason() {
        let mut bad = payload();
        bad.reason = String::new();
        let err = RefundRequest::new(bad, None).unwrap_err();
        assert_eq!(err.code, RejectCode::InvalidRequest);
    }

    #[test]
    fn test_request_rejects_lowercase_transaction_id() {
        let mut bad = payload();
        bad.transaction_id = "txn-1".into();
        assert!(RefundRequest::new(bad, None).is_err());
    }

    #[test]
    fn test_request_rejects_empty_item_list() {
        let mut bad = payload();
        bad.item_ids = Some(vec![]);
        let err = RefundRequest::new(bad, None).unwrap_err();
        assert_eq!(err.code, RejectCode::InvalidRequest);
    }

    #[test]
    fn test_request_rejects_oversized_idempotency_key() {
        let err = RefundRequest::new(payload(), Some("K".repeat(101))).unwrap_err();
        assert_eq!(err.code, RejectCode::InvalidRequest);
    }

    #[test]
    fn test_payload_rejects_smuggled_idempotency_key() {
        let json = r#"{
            "transaction_id": "TXN-1",
            "operator_id": "op-1",
            "reason": "damaged",
            "idempotency_key": "KEY-1"
        }"#;
        let result: std::result::Result<RefundPayload, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_refund_id_format() {
        let id = new_refund_id();
        assert!(id.starts_with("RF-"));
        assert_eq!(id.len(), 11);
        assert!(
            id[3..]
                .chars()
                .all(|ch| ch.is_ascii_digit() || ch.is_ascii_uppercase())
        );
    }
}
