//! Audit recorder: builds and appends the three kinds of trail entries.
//!
//! Every processed request leaves at least one entry; nothing here is ever
//! updated or removed afterwards.

use serde_json::json;

use crate::domain::audit::{AuditAction, AuditEntry};
use crate::domain::breakdown::Breakdown;
use crate::domain::ports::RefundStore;
use crate::domain::refund::{RefundRequest, RefundResult};
use crate::error::{Rejection, Result};

/// Records that a refund was requested, before any validation runs.
pub async fn record_requested(
    store: &dyn RefundStore,
    request: &RefundRequest,
    request_id: &str,
) -> Result<()> {
    let mut reasoning = format!(
        "Refund requested by operator '{}' for transaction {}.",
        request.operator_id, request.transaction_id
    );
    if let Some(item_ids) = &request.item_ids {
        reasoning.push_str(&format!(" Partial refund for items: {item_ids:?}."));
    }

    let mut entry = AuditEntry::new(
        AuditAction::RefundRequested,
        &request.transaction_id,
        &request.operator_id,
        request_id,
    );
    entry.reasoning = reasoning;
    if let Some(item_ids) = &request.item_ids {
        entry.calculation_detail = json!({ "item_ids": item_ids });
    }

    store.append_audit(entry).await?;
    Ok(())
}

/// Records an approved refund with the full breakdown snapshot.
pub async fn record_approved(
    store: &dyn RefundStore,
    result: &RefundResult,
    request_id: &str,
) -> Result<()> {
    let mut entry = AuditEntry::new(
        AuditAction::RefundApproved,
        &result.transaction_id,
        &result.operator_id,
        request_id,
    );
    entry.refund_id = Some(result.refund_id.clone());
    entry.reasoning = approval_reasoning(result);
    entry.calculation_detail = serde_json::to_value(&result.calculation_breakdown)?;
    entry.amount = Some(result.total_refund_amount);
    entry.currency = Some(result.currency.clone());

    store.append_audit(entry).await?;
    Ok(())
}

/// Records a rejected refund with the rule's code and message.
pub async fn record_rejected(
    store: &dyn RefundStore,
    transaction_id: &str,
    operator_id: &str,
    request_id: &str,
    rejection: &Rejection,
) -> Result<()> {
    let mut entry = AuditEntry::new(
        AuditAction::RefundRejected,
        transaction_id,
        operator_id,
        request_id,
    );
    entry.reasoning = format!(
        "Refund rejected. Code: {}. Reason: {}",
        rejection.code.as_str(),
        rejection.message
    );
    entry.calculation_detail = json!({ "error_code": rejection.code.as_str() });

    store.append_audit(entry).await?;
    Ok(())
}

/// Human-readable narrative of an approved refund for the audit trail.
pub fn approval_reasoning(result: &RefundResult) -> String {
    let breakdown = &result.calculation_breakdown;
    let mut lines = Vec::new();

    match unwrapped(breakdown) {
        Breakdown::Partial(detail) => {
            lines.push(format!(
                "Partial refund approved for items totalling {} {}. Item ratio: {} ({} / subtotal).",
                detail.items_subtotal, result.currency, detail.item_ratio, detail.items_subtotal
            ));
            lines.push(format!(
                "Proportional tax: {} ({}).",
                detail.proportional_tax, result.currency
            ));
            lines.push(format!(
                "Proportional shipping: {} ({}).",
                detail.proportional_shipping, result.currency
            ));
        }
        Breakdown::Installment(detail) => {
            lines.push(format!(
                "Installment refund approved. {} of {} installments charged. \
                 Installment value: {} {}. Charged amount: {} {}.",
                detail.installments_charged,
                detail.installments_total,
                detail.installment_value,
                result.currency,
                detail.charged_amount,
                result.currency
            ));
        }
        _ => {
            lines.push(format!(
                "Full refund approved for transaction {}.",
                result.transaction_id
            ));
        }
    }

    lines.push(format!(
        "Total refund: {} {}.",
        result.total_refund_amount, result.currency
    ));

    if !breakdown.payments().is_empty() {
        let distribution: Vec<String> = breakdown
            .payments()
            .iter()
            .map(|p| format!("{} {} {}", p.payment_type.as_str(), p.refund_amount, p.currency))
            .collect();
        lines.push(format!("Distribution: {}.", distribution.join(", ")));
    }

    if let (Some(usd), Some(rate)) = (breakdown.usd_equivalent(), breakdown.exchange_rate_used()) {
        lines.push(format!("USD equivalent: {usd} USD (exchange rate: {rate})."));
    }

    lines.join(" ")
}

fn unwrapped(breakdown: &Breakdown) -> &Breakdown {
    match breakdown {
        Breakdown::CrossBorder { inner, .. } => inner,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::breakdown::{FullDetail, PartialDetail, PaymentRefund};
    use crate::domain::refund::RefundStatus;
    use crate::domain::transaction::PaymentMethodType;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn result_with(breakdown: Breakdown) -> RefundResult {
        RefundResult {
            refund_id: "RF-TEST0001".into(),
            transaction_id: "TXN-1".into(),
            status: RefundStatus::Approved,
            total_refund_amount: breakdown.total_refund(),
            currency: "BRL".into(),
            operator_id: "op-1".into(),
            reason: "damaged".into(),
            calculation_breakdown: breakdown,
            created_at: Utc::now(),
            idempotency_key: None,
        }
    }

    fn card_refund(amount: rust_decimal::Decimal) -> PaymentRefund {
        PaymentRefund {
            payment_id: "PAY-1".into(),
            payment_type: PaymentMethodType::Card,
            original_amount: amount,
            refund_amount: amount,
            currency: "BRL".into(),
        }
    }

    #[test]
    fn test_full_refund_reasoning() {
        let result = result_with(Breakdown::Full(FullDetail {
            total_refund: dec!(64.00),
            payments: vec![card_refund(dec!(64.00))],
        }));
        let reasoning = approval_reasoning(&result);
        assert!(reasoning.contains("Full refund approved for transaction TXN-1."));
        assert!(reasoning.contains("Total refund: 64.00 BRL."));
        assert!(reasoning.contains("Distribution: CARD 64.00 BRL."));
    }

    #[test]
    fn test_partial_refund_reasoning() {
        let result = result_with(Breakdown::Partial(PartialDetail {
            items_subtotal: dec!(30.00),
            item_ratio: dec!(0.60),
            proportional_tax: dec!(5.40),
            proportional_shipping: dec!(3.00),
            total_refund: dec!(38.40),
            payments: vec![card_refund(dec!(38.40))],
        }));
        let reasoning = approval_reasoning(&result);
        assert!(reasoning.contains("Partial refund approved"));
        assert!(reasoning.contains("Proportional tax: 5.40 (BRL)."));
        assert!(reasoning.contains("Proportional shipping: 3.00 (BRL)."));
    }

    #[test]
    fn test_cross_border_reasoning_includes_usd() {
        let result = result_with(Breakdown::CrossBorder {
            inner: Box::new(Breakdown::Full(FullDetail {
                total_refund: dec!(64.00),
                payments: vec![card_refund(dec!(64.00))],
            })),
            usd_equivalent: dec!(12.31),
            exchange_rate_used: dec!(5.20),
        });
        let reasoning = approval_reasoning(&result);
        assert!(reasoning.contains("USD equivalent: 12.31 USD (exchange rate: 5.20)."));
    }
}
