use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    RefundRequested,
    RefundApproved,
    RefundRejected,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::RefundRequested => "REFUND_REQUESTED",
            AuditAction::RefundApproved => "REFUND_APPROVED",
            AuditAction::RefundRejected => "REFUND_REJECTED",
        }
    }
}

/// Append-only trail entry. The store exposes no mutation besides append,
/// so the log size is monotonically non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub refund_id: Option<String>,
    pub transaction_id: String,
    pub operator_id: String,
    pub action: AuditAction,
    pub reasoning: String,
    pub calculation_detail: Value,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub request_id: String,
}

impl AuditEntry {
    pub fn new(
        action: AuditAction,
        transaction_id: impl Into<String>,
        operator_id: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            refund_id: None,
            transaction_id: transaction_id.into(),
            operator_id: operator_id.into(),
            action,
            reasoning: String::new(),
            calculation_detail: serde_json::json!({}),
            amount: None,
            currency: None,
            request_id: request_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serialization() {
        let json = serde_json::to_string(&AuditAction::RefundRequested).unwrap();
        assert_eq!(json, "\"REFUND_REQUESTED\"");
        assert_eq!(AuditAction::RefundRejected.as_str(), "REFUND_REJECTED");
    }

    #[test]
    fn test_new_entry_defaults() {
        let entry = AuditEntry::new(AuditAction::RefundRequested, "TXN-1", "op-1", "req-1");
        assert_eq!(entry.transaction_id, "TXN-1");
        assert!(entry.refund_id.is_none());
        assert!(entry.amount.is_none());
        assert_eq!(entry.calculation_detail, serde_json::json!({}));
    }
}
