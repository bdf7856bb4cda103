//! Refund calculation engine.
//!
//! Pure functions with no I/O or shared state. All monetary math uses
//! `Decimal`; rounding is half-up to 2 places and happens only when a value
//! becomes part of the output breakdown.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::breakdown::{
    Breakdown, FullDetail, InstallmentDetail, PartialDetail, PaymentRefund,
};
use crate::domain::money::round_money;
use crate::domain::transaction::{PaymentMethod, Transaction};

/// A financial guard tripped. Given a well-formed transaction these are
/// contract violations, but the orchestrator treats every one of them as a
/// recoverable rejection, never a fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("cannot distribute refund: transaction total is zero")]
    ZeroTransactionTotal,
    #[error("cannot calculate item ratio: transaction subtotal is zero")]
    ZeroSubtotal,
    #[error("no installment payment method found on transaction")]
    NoInstallmentMethod,
    #[error("installment total count cannot be zero")]
    ZeroInstallmentCount,
    #[error("cross-border transaction missing exchange rate")]
    MissingExchangeRate,
    #[error("cannot convert currency: exchange rate is zero")]
    ZeroExchangeRate,
}

/// Full refund: each payment method gets back exactly what it paid, so the
/// split-payment sum equals the transaction total with no fresh rounding.
pub fn full_refund(transaction: &Transaction) -> Result<Breakdown, CalcError> {
    if transaction.total.is_zero() {
        return Err(CalcError::ZeroTransactionTotal);
    }

    let payments = transaction
        .payments
        .iter()
        .map(|payment| PaymentRefund {
            payment_id: payment.id.clone(),
            payment_type: payment.r#type,
            original_amount: payment.amount,
            refund_amount: payment.amount,
            currency: payment.currency.clone(),
        })
        .collect();

    with_usd_equivalent(
        transaction,
        Breakdown::Full(FullDetail {
            total_refund: transaction.total,
            payments,
        }),
    )
}

/// Partial refund for an item subset. Tax and shipping are refunded in
/// proportion to the item ratio; the ratio itself stays at full precision
/// until the individual components are quantized.
pub fn partial_refund(transaction: &Transaction, item_ids: &[String]) -> Result<Breakdown, CalcError> {
    if transaction.subtotal.is_zero() {
        return Err(CalcError::ZeroSubtotal);
    }
    if transaction.total.is_zero() {
        return Err(CalcError::ZeroTransactionTotal);
    }

    let items_subtotal = transaction.items_subtotal(item_ids);
    let ratio = items_subtotal / transaction.subtotal;
    let proportional_tax = round_money(transaction.tax * ratio);
    let proportional_shipping = round_money(transaction.shipping * ratio);
    let total_refund = round_money(items_subtotal + proportional_tax + proportional_shipping);

    let payments = distribute_refund(&transaction.payments, total_refund, transaction.total)?;

    with_usd_equivalent(
        transaction,
        Breakdown::Partial(PartialDetail {
            items_subtotal: round_money(items_subtotal),
            item_ratio: round_money(ratio),
            proportional_tax,
            proportional_shipping,
            total_refund,
            payments,
        }),
    )
}

/// Installment refund: only charged installments are refundable, net of what
/// was already refunded. The per-installment value is not rounded before the
/// charged amount is derived from it.
pub fn installment_refund(
    transaction: &Transaction,
    already_refunded: Decimal,
) -> Result<Breakdown, CalcError> {
    let payment = transaction
        .installment_payment()
        .ok_or(CalcError::NoInstallmentMethod)?;
    let installments_total = payment.installments_total.unwrap_or(0);
    if installments_total == 0 {
        return Err(CalcError::ZeroInstallmentCount);
    }
    if transaction.total.is_zero() {
        return Err(CalcError::ZeroTransactionTotal);
    }

    let installment_value = payment.amount / Decimal::from(installments_total);
    let installments_charged = payment.installments_charged.unwrap_or(0);
    let charged_amount = round_money(installment_value * Decimal::from(installments_charged));
    let refundable = (charged_amount - already_refunded).max(Decimal::ZERO);
    let total_refund = round_money(refundable);

    let payments = distribute_refund(&transaction.payments, total_refund, transaction.total)?;

    Ok(Breakdown::Installment(InstallmentDetail {
        installments_total,
        installments_charged,
        installment_value: round_money(installment_value),
        charged_amount,
        total_refund,
        payments,
    }))
}

/// Cross-border refund: delegates to the partial or full shape and converts
/// the result to USD with the rate captured at purchase time, never a live
/// rate.
pub fn cross_border_refund(
    transaction: &Transaction,
    item_ids: Option<&[String]>,
) -> Result<Breakdown, CalcError> {
    let rate = transaction
        .exchange_rate_to_usd
        .ok_or(CalcError::MissingExchangeRate)?;
    if rate.is_zero() {
        return Err(CalcError::ZeroExchangeRate);
    }

    let breakdown = match item_ids {
        Some(ids) if !ids.is_empty() => partial_refund(transaction, ids)?,
        _ => full_refund(transaction)?,
    };

    match breakdown {
        wrapped @ Breakdown::CrossBorder { .. } => Ok(wrapped),
        inner => {
            let usd = usd_equivalent(inner.total_refund(), rate)?;
            Ok(Breakdown::CrossBorder {
                inner: Box::new(inner),
                usd_equivalent: usd,
                exchange_rate_used: rate,
            })
        }
    }
}

/// Distributes a refund across payment methods by original payment weight,
/// rounding each share independently. The shares therefore sum to the total
/// within one rounding unit, not necessarily exactly.
pub fn distribute_refund(
    payments: &[PaymentMethod],
    total_refund: Decimal,
    transaction_total: Decimal,
) -> Result<Vec<PaymentRefund>, CalcError> {
    if transaction_total.is_zero() {
        return Err(CalcError::ZeroTransactionTotal);
    }

    Ok(payments
        .iter()
        .map(|payment| {
            let weight = payment.amount / transaction_total;
            PaymentRefund {
                payment_id: payment.id.clone(),
                payment_type: payment.r#type,
                original_amount: payment.amount,
                refund_amount: round_money(total_refund * weight),
                currency: payment.currency.clone(),
            }
        })
        .collect())
}

/// Converts a local-currency amount to USD with the stored purchase-time rate.
pub fn usd_equivalent(local_amount: Decimal, exchange_rate_to_usd: Decimal) -> Result<Decimal, CalcError> {
    if exchange_rate_to_usd.is_zero() {
        return Err(CalcError::ZeroExchangeRate);
    }
    Ok(round_money(local_amount / exchange_rate_to_usd))
}

fn with_usd_equivalent(
    transaction: &Transaction,
    breakdown: Breakdown,
) -> Result<Breakdown, CalcError> {
    match transaction.exchange_rate_to_usd {
        Some(rate) if transaction.is_cross_border && !rate.is_zero() => {
            let usd = usd_equivalent(breakdown.total_refund(), rate)?;
            Ok(Breakdown::CrossBorder {
                inner: Box::new(breakdown),
                usd_equivalent: usd,
                exchange_rate_used: rate,
            })
        }
        _ => Ok(breakdown),
    }
}
