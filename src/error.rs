use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RefundError>;

/// Machine-readable rejection vocabulary. Every business-rule or financial
/// guard failure maps to exactly one of these codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectCode {
    TransactionNotFound,
    InvalidTransactionStatus,
    DuplicateRefund,
    InvalidItemIds,
    RefundAmountExceeded,
    InstallmentNotCharged,
    CalculationError,
    InvalidRequest,
}

impl RejectCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectCode::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            RejectCode::InvalidTransactionStatus => "INVALID_TRANSACTION_STATUS",
            RejectCode::DuplicateRefund => "DUPLICATE_REFUND",
            RejectCode::InvalidItemIds => "INVALID_ITEM_IDS",
            RejectCode::RefundAmountExceeded => "REFUND_AMOUNT_EXCEEDED",
            RejectCode::InstallmentNotCharged => "INSTALLMENT_NOT_CHARGED",
            RejectCode::CalculationError => "CALCULATION_ERROR",
            RejectCode::InvalidRequest => "INVALID_REQUEST",
        }
    }

    /// Suggested transport status for this code. The transport layer owns
    /// the actual response rendering.
    pub fn http_status(&self) -> u16 {
        match self {
            RejectCode::TransactionNotFound => 404,
            RejectCode::DuplicateRefund => 409,
            _ => 422,
        }
    }
}

/// An expected negative outcome of a refund request: a business rule or a
/// financial guard said no. Always audited, never treated as a fault.
#[derive(Debug, Clone, Error)]
#[error("{}: {message}", .code.as_str())]
pub struct Rejection {
    pub code: RejectCode,
    pub message: String,
    pub details: Value,
}

impl Rejection {
    pub fn new(code: RejectCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: json!({}),
        }
    }

    pub fn with_details(code: RejectCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }

    pub fn invalid_request(field: &'static str, message: impl Into<String>) -> Self {
        Self::with_details(
            RejectCode::InvalidRequest,
            message,
            json!({ "field": field }),
        )
    }
}

/// Failures surfaced by a store implementation. The conflict variants come
/// out of the checked refund insert and are mapped back to rejections by the
/// orchestrator; the rest indicate a broken caller contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("transaction {0} not found")]
    UnknownTransaction(String),
    #[error("refund {0} already exists")]
    DuplicateRefundId(String),
    #[error("a full refund {existing_refund_id} already exists for transaction {transaction_id}")]
    FullRefundExists {
        transaction_id: String,
        existing_refund_id: String,
    },
    #[error("refund of {attempted} exceeds remaining refundable balance {remaining}")]
    BalanceExceeded {
        attempted: Decimal,
        remaining: Decimal,
    },
    #[error("idempotency key is already bound to refund {refund_id}")]
    KeyAlreadyBound { refund_id: String },
}

#[derive(Debug, Error)]
pub enum RefundError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RefundError {
    /// The rejection carried by this error, if it is one. Anything else is a
    /// defect and must not leak detail past the transport boundary.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            RefundError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_code_transport_status() {
        assert_eq!(RejectCode::TransactionNotFound.http_status(), 404);
        assert_eq!(RejectCode::DuplicateRefund.http_status(), 409);
        assert_eq!(RejectCode::RefundAmountExceeded.http_status(), 422);
        assert_eq!(RejectCode::CalculationError.http_status(), 422);
    }

    #[test]
    fn test_rejection_display() {
        let rejection = Rejection::new(RejectCode::DuplicateRefund, "already refunded");
        assert_eq!(rejection.to_string(), "DUPLICATE_REFUND: already refunded");
    }

    #[test]
    fn test_rejection_extraction() {
        let err = RefundError::from(Rejection::new(RejectCode::InvalidItemIds, "bad ids"));
        assert_eq!(err.rejection().unwrap().code, RejectCode::InvalidItemIds);

        let err = RefundError::from(StoreError::UnknownTransaction("TXN-1".into()));
        assert!(err.rejection().is_none());
    }
}
