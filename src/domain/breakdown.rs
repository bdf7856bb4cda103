use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::domain::transaction::PaymentMethodType;

/// One payment method's share of a refund.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRefund {
    pub payment_id: String,
    pub payment_type: PaymentMethodType,
    pub original_amount: Decimal,
    pub refund_amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FullDetail {
    pub total_refund: Decimal,
    pub payments: Vec<PaymentRefund>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartialDetail {
    pub items_subtotal: Decimal,
    /// Stored at 2 dp for display; the calculation uses the full-precision ratio.
    pub item_ratio: Decimal,
    pub proportional_tax: Decimal,
    pub proportional_shipping: Decimal,
    pub total_refund: Decimal,
    pub payments: Vec<PaymentRefund>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstallmentDetail {
    pub installments_total: u32,
    pub installments_charged: u32,
    /// Stored at 2 dp; charged_amount is derived from the unrounded value.
    pub installment_value: Decimal,
    pub charged_amount: Decimal,
    pub total_refund: Decimal,
    pub payments: Vec<PaymentRefund>,
}

/// Per-scenario refund breakdown. Cross-border refunds wrap the full or
/// partial shape they delegate to and add the USD conversion on top.
#[derive(Debug, Clone, PartialEq)]
pub enum Breakdown {
    Full(FullDetail),
    Partial(PartialDetail),
    Installment(InstallmentDetail),
    CrossBorder {
        inner: Box<Breakdown>,
        usd_equivalent: Decimal,
        exchange_rate_used: Decimal,
    },
}

impl Breakdown {
    pub fn total_refund(&self) -> Decimal {
        match self {
            Breakdown::Full(detail) => detail.total_refund,
            Breakdown::Partial(detail) => detail.total_refund,
            Breakdown::Installment(detail) => detail.total_refund,
            Breakdown::CrossBorder { inner, .. } => inner.total_refund(),
        }
    }

    pub fn payments(&self) -> &[PaymentRefund] {
        match self {
            Breakdown::Full(detail) => &detail.payments,
            Breakdown::Partial(detail) => &detail.payments,
            Breakdown::Installment(detail) => &detail.payments,
            Breakdown::CrossBorder { inner, .. } => inner.payments(),
        }
    }

    pub fn item_ratio(&self) -> Option<Decimal> {
        match self {
            Breakdown::Partial(detail) => Some(detail.item_ratio),
            Breakdown::CrossBorder { inner, .. } => inner.item_ratio(),
            _ => None,
        }
    }

    pub fn installments_total(&self) -> Option<u32> {
        match self {
            Breakdown::Installment(detail) => Some(detail.installments_total),
            Breakdown::CrossBorder { inner, .. } => inner.installments_total(),
            _ => None,
        }
    }

    pub fn usd_equivalent(&self) -> Option<Decimal> {
        match self {
            Breakdown::CrossBorder { usd_equivalent, .. } => Some(*usd_equivalent),
            _ => None,
        }
    }

    pub fn exchange_rate_used(&self) -> Option<Decimal> {
        match self {
            Breakdown::CrossBorder {
                exchange_rate_used, ..
            } => Some(*exchange_rate_used),
            _ => None,
        }
    }

    /// A breakdown with no item subset and no installment schedule is a
    /// full-coverage shape; the store uses this to spot duplicate full refunds.
    pub fn is_full_shape(&self) -> bool {
        self.item_ratio().is_none() && self.installments_total().is_none()
    }

    pub fn scenario(&self) -> &'static str {
        match self {
            Breakdown::Full(detail) => {
                if detail.payments.len() == 1 {
                    "A: Full refund, single payment method"
                } else {
                    "B: Full refund, split payment"
                }
            }
            Breakdown::Partial(_) => "C: Partial refund, item subset",
            Breakdown::Installment(_) => "D: Installment refund",
            Breakdown::CrossBorder { inner, .. } => match inner.as_ref() {
                Breakdown::Partial(_) => "E: Cross-border partial refund",
                _ => "E: Cross-border full refund",
            },
        }
    }
}

/// Flat wire representation. Every field serializes on every scenario,
/// absent ones as null, so downstream consumers see a stable shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownWire {
    pub scenario: String,
    pub items_subtotal: Option<Decimal>,
    pub item_ratio: Option<Decimal>,
    pub proportional_tax: Option<Decimal>,
    pub proportional_shipping: Option<Decimal>,
    pub total_refund: Decimal,
    pub payment_breakdown: Vec<PaymentRefund>,
    pub usd_equivalent: Option<Decimal>,
    pub exchange_rate_used: Option<Decimal>,
    pub installments_charged: Option<u32>,
    pub installments_total: Option<u32>,
    pub installment_value: Option<Decimal>,
    pub charged_amount: Option<Decimal>,
}

impl From<&Breakdown> for BreakdownWire {
    fn from(breakdown: &Breakdown) -> Self {
        match breakdown {
            Breakdown::Full(detail) => BreakdownWire {
                scenario: breakdown.scenario().to_string(),
                items_subtotal: None,
                item_ratio: None,
                proportional_tax: None,
                proportional_shipping: None,
                total_refund: detail.total_refund,
                payment_breakdown: detail.payments.clone(),
                usd_equivalent: None,
                exchange_rate_used: None,
                installments_charged: None,
                installments_total: None,
                installment_value: None,
                charged_amount: None,
            },
            Breakdown::Partial(detail) => BreakdownWire {
                scenario: breakdown.scenario().to_string(),
                items_subtotal: Some(detail.items_subtotal),
                item_ratio: Some(detail.item_ratio),
                proportional_tax: Some(detail.proportional_tax),
                proportional_shipping: Some(detail.proportional_shipping),
                total_refund: detail.total_refund,
                payment_breakdown: detail.payments.clone(),
                usd_equivalent: None,
                exchange_rate_used: None,
                installments_charged: None,
                installments_total: None,
                installment_value: None,
                charged_amount: None,
            },
            Breakdown::Installment(detail) => BreakdownWire {
                scenario: breakdown.scenario().to_string(),
                items_subtotal: None,
                item_ratio: None,
                proportional_tax: None,
                proportional_shipping: None,
                total_refund: detail.total_refund,
                payment_breakdown: detail.payments.clone(),
                usd_equivalent: None,
                exchange_rate_used: None,
                installments_charged: Some(detail.installments_charged),
                installments_total: Some(detail.installments_total),
                installment_value: Some(detail.installment_value),
                charged_amount: Some(detail.charged_amount),
            },
            Breakdown::CrossBorder {
                inner,
                usd_equivalent,
                exchange_rate_used,
            } => {
                let mut wire = BreakdownWire::from(inner.as_ref());
                wire.scenario = breakdown.scenario().to_string();
                wire.usd_equivalent = Some(*usd_equivalent);
                wire.exchange_rate_used = Some(*exchange_rate_used);
                wire
            }
        }
    }
}

impl Serialize for Breakdown {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        BreakdownWire::from(self).serialize(serializer)
    }
}
