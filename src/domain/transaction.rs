use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Authorized,
    Captured,
    Settled,
    Voided,
    Chargebacked,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Authorized => "AUTHORIZED",
            TransactionStatus::Captured => "CAPTURED",
            TransactionStatus::Settled => "SETTLED",
            TransactionStatus::Voided => "VOIDED",
            TransactionStatus::Chargebacked => "CHARGEBACKED",
        }
    }

    /// Only captured or settled transactions can be refunded.
    pub fn allows_refund(&self) -> bool {
        matches!(self, TransactionStatus::Captured | TransactionStatus::Settled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethodType {
    Card,
    Wallet,
    BankTransfer,
    Cash,
}

impl PaymentMethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodType::Card => "CARD",
            PaymentMethodType::Wallet => "WALLET",
            PaymentMethodType::BankTransfer => "BANK_TRANSFER",
            PaymentMethodType::Cash => "CASH",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl Item {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentMethod {
    pub id: String,
    pub r#type: PaymentMethodType,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub installments_total: Option<u32>,
    #[serde(default)]
    pub installments_charged: Option<u32>,
    #[serde(default)]
    pub card_last4: Option<String>,
}

/// A recorded retail transaction. Immutable once created: the engine only
/// ever reads snapshots of it, refunds are tracked separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transaction {
    pub id: String,
    pub status: TransactionStatus,
    pub currency: String,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub items: Vec<Item>,
    pub payments: Vec<PaymentMethod>,
    #[serde(default)]
    pub exchange_rate_to_usd: Option<Decimal>,
    #[serde(default)]
    pub is_cross_border: bool,
    pub merchant_id: String,
}

impl Transaction {
    /// Sum of line totals for the items whose id appears in `item_ids`.
    /// Unmatched ids are silently excluded; callers validate membership.
    pub fn items_subtotal(&self, item_ids: &[String]) -> Decimal {
        self.items
            .iter()
            .filter(|item| item_ids.contains(&item.id))
            .map(Item::line_total)
            .sum()
    }

    pub fn installment_payment(&self) -> Option<&PaymentMethod> {
        self.payments
            .iter()
            .find(|payment| payment.installments_total.is_some())
    }

    pub fn has_installments(&self) -> bool {
        self.installment_payment().is_some()
    }

    /// Structural invariants enforced when a transaction enters the store.
    /// The engine itself does not re-verify these.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id.is_empty() {
            return Err("transaction id must not be empty".into());
        }
        if self.total <= Decimal::ZERO {
            return Err(format!("transaction {} total must be positive", self.id));
        }
        if self.subtotal < Decimal::ZERO || self.tax < Decimal::ZERO || self.shipping < Decimal::ZERO
        {
            return Err(format!(
                "transaction {} subtotal/tax/shipping must not be negative",
                self.id
            ));
        }
        if self.currency.len() != 3 {
            return Err(format!(
                "transaction {} currency must be a 3-letter code",
                self.id
            ));
        }
        for item in &self.items {
            if item.unit_price <= Decimal::ZERO {
                return Err(format!("item {} unit price must be positive", item.id));
            }
            if item.quantity == 0 {
                return Err(format!("item {} quantity must be at least 1", item.id));
            }
        }
        for payment in &self.payments {
            if payment.amount <= Decimal::ZERO {
                return Err(format!("payment {} amount must be positive", payment.id));
            }
            if payment.installments_total == Some(0) {
                return Err(format!(
                    "payment {} installments_total must be at least 1",
                    payment.id
                ));
            }
        }
        Ok(())
    }
}
