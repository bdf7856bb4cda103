//! Ordered business-rule validation for refund requests.
//!
//! Rules read store state but never write it. They run in a fixed order:
//! each rule may assume everything before it held.

use rust_decimal::Decimal;
use serde_json::json;

use crate::domain::money::round_money;
use crate::domain::ports::RefundStore;
use crate::domain::refund::RefundRequest;
use crate::domain::transaction::{Transaction, TransactionStatus};
use crate::error::{RejectCode, Rejection, Result};

pub struct RuleValidator<'a> {
    store: &'a dyn RefundStore,
}

impl<'a> RuleValidator<'a> {
    pub fn new(store: &'a dyn RefundStore) -> Self {
        Self { store }
    }

    /// Runs all six rules in order; the first failing rule produces the
    /// rejection. Returns the transaction snapshot on success.
    pub async fn validate(&self, request: &RefundRequest) -> Result<Transaction> {
        let transaction = self.transaction_exists(&request.transaction_id).await?;
        status_allows_refund(&transaction)?;
        self.no_duplicate_refund(request, &transaction).await?;
        if let Some(item_ids) = &request.item_ids {
            item_ids_exist(item_ids, &transaction)?;
        }
        self.refundable_balance(request, &transaction).await?;
        if request.item_ids.is_none() {
            installments_charged(&transaction)?;
        }
        Ok(transaction)
    }

    /// Rule 1: the transaction must exist.
    async fn transaction_exists(&self, transaction_id: &str) -> Result<Transaction> {
        match self.store.get_transaction(transaction_id).await? {
            Some(transaction) => Ok(transaction),
            None => Err(Rejection::new(
                RejectCode::TransactionNotFound,
                format!("Transaction {transaction_id} not found"),
            )
            .into()),
        }
    }

    /// Rule 3: neither a reused idempotency key nor a second full refund.
    ///
    /// The key check fires even though the orchestrator short-circuits known
    /// keys before validation; it covers requests that race past that check.
    async fn no_duplicate_refund(
        &self,
        request: &RefundRequest,
        transaction: &Transaction,
    ) -> Result<()> {
        if let Some(key) = &request.idempotency_key
            && let Some(refund_id) = self.store.refund_id_for_key(key).await?
            && let Some(existing) = self.store.get_refund(&refund_id).await?
        {
            return Err(Rejection::with_details(
                RejectCode::DuplicateRefund,
                format!(
                    "A refund with this idempotency key already exists for transaction {}",
                    transaction.id
                ),
                json!({
                    "existing_refund_id": existing.refund_id,
                    "refunded_at": existing.created_at.to_rfc3339(),
                }),
            )
            .into());
        }

        if request.item_ids.is_none()
            && let Some(refund_id) = self.store.existing_full_refund(&transaction.id).await?
        {
            let refunded_at = self
                .store
                .get_refund(&refund_id)
                .await?
                .map(|refund| refund.created_at.to_rfc3339());
            return Err(Rejection::with_details(
                RejectCode::DuplicateRefund,
                format!(
                    "A full refund already exists for transaction {}",
                    transaction.id
                ),
                json!({
                    "existing_refund_id": refund_id,
                    "refunded_at": refunded_at,
                }),
            )
            .into());
        }

        Ok(())
    }

    /// Rule 5: the refund must fit the remaining refundable balance. For
    /// partial refunds this pre-estimates the amount; the orchestrator's
    /// post-calculation check stays authoritative.
    async fn refundable_balance(
        &self,
        request: &RefundRequest,
        transaction: &Transaction,
    ) -> Result<()> {
        let already_refunded = self.store.total_refunded(&transaction.id).await?;
        let remaining = transaction.total - already_refunded;

        if remaining <= Decimal::ZERO {
            return Err(Rejection::with_details(
                RejectCode::RefundAmountExceeded,
                format!(
                    "Transaction {} has already been fully refunded",
                    transaction.id
                ),
                json!({
                    "transaction_total": transaction.total.to_string(),
                    "already_refunded": already_refunded.to_string(),
                    "remaining_refundable": "0.00",
                }),
            )
            .into());
        }

        if let Some(item_ids) = &request.item_ids
            && transaction.subtotal > Decimal::ZERO
        {
            let items_subtotal = transaction.items_subtotal(item_ids);
            let ratio = items_subtotal / transaction.subtotal;
            let estimate = round_money(
                items_subtotal + transaction.tax * ratio + transaction.shipping * ratio,
            );
            if estimate > remaining {
                return Err(Rejection::with_details(
                    RejectCode::RefundAmountExceeded,
                    format!(
                        "Estimated refund {} {} exceeds remaining refundable balance {} {}",
                        estimate, transaction.currency, remaining, transaction.currency
                    ),
                    json!({
                        "estimated_refund": estimate.to_string(),
                        "remaining_refundable": remaining.to_string(),
                    }),
                )
                .into());
            }
        }

        Ok(())
    }
}

/// Rule 2: only captured or settled transactions can be refunded, with a
/// distinct explanation per disallowed status.
fn status_allows_refund(transaction: &Transaction) -> Result<()> {
    if transaction.status.allows_refund() {
        return Ok(());
    }

    let message = match transaction.status {
        TransactionStatus::Chargebacked => format!(
            "Transaction {} cannot be refunded: status is CHARGEBACKED. \
             Chargebacks are handled by the disputes process, not this service.",
            transaction.id
        ),
        TransactionStatus::Voided => format!(
            "Transaction {} cannot be refunded: status is VOIDED. \
             Use void/cancel operations for pre-capture reversals.",
            transaction.id
        ),
        TransactionStatus::Authorized => format!(
            "Transaction {} is authorized but not yet captured. Use void/cancel instead.",
            transaction.id
        ),
        _ => format!(
            "Transaction {} has status {}, which does not allow refunds.",
            transaction.id,
            transaction.status.as_str()
        ),
    };

    Err(Rejection::with_details(
        RejectCode::InvalidTransactionStatus,
        message,
        json!({ "status": transaction.status.as_str() }),
    )
    .into())
}

/// Rule 4: every requested item id must belong to the transaction.
fn item_ids_exist(item_ids: &[String], transaction: &Transaction) -> Result<()> {
    let known: Vec<&str> = transaction
        .items
        .iter()
        .map(|item| item.id.as_str())
        .collect();
    let unknown: Vec<&String> = item_ids
        .iter()
        .filter(|id| !known.contains(&id.as_str()))
        .collect();

    if !unknown.is_empty() {
        return Err(Rejection::with_details(
            RejectCode::InvalidItemIds,
            format!(
                "The following item IDs were not found in transaction {}: {unknown:?}",
                transaction.id
            ),
            json!({
                "unknown_item_ids": unknown,
                "valid_item_ids": known,
            }),
        )
        .into());
    }
    Ok(())
}

/// Rule 6: a full-refund intent against an installment plan needs at least
/// one charged installment.
fn installments_charged(transaction: &Transaction) -> Result<()> {
    let Some(payment) = transaction.installment_payment() else {
        return Ok(());
    };

    let charged = payment.installments_charged.unwrap_or(0);
    if charged == 0 {
        return Err(Rejection::with_details(
            RejectCode::InstallmentNotCharged,
            format!(
                "No installments have been charged yet for transaction {}. \
                 Cannot refund uncharged installments.",
                transaction.id
            ),
            json!({
                "installments_total": payment.installments_total,
                "installments_charged": charged,
            }),
        )
        .into());
    }
    Ok(())
}
