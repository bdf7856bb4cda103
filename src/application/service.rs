//! Refund orchestration: idempotency check, audit, validation, calculation,
//! balance re-check, persistence.
//!
//! This is the only component allowed to mutate refund and idempotency
//! state. Engine guard failures never escape as faults; each one becomes a
//! recorded rejection.

use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::audit::AuditEntry;
use crate::domain::breakdown::Breakdown;
use crate::domain::ports::{RefundStore, RefundStoreRef};
use crate::domain::refund::{RefundRequest, RefundResult};
use crate::domain::transaction::Transaction;
use crate::engine;
use crate::error::{RefundError, RejectCode, Rejection, Result, StoreError};

use super::{audit, validator::RuleValidator};

/// Outcome of processing a refund request. `replayed` is true when a
/// previously persisted result was returned for a repeated idempotency key;
/// the transport layer maps that to "already processed" instead of "created".
#[derive(Debug, Clone, PartialEq)]
pub struct RefundOutcome {
    pub result: RefundResult,
    pub replayed: bool,
}

pub struct RefundService {
    store: RefundStoreRef,
}

impl RefundService {
    pub fn new(store: RefundStoreRef) -> Self {
        Self { store }
    }

    /// The sole mutating entry point.
    pub async fn process_refund(
        &self,
        request: RefundRequest,
        request_id: &str,
    ) -> Result<RefundOutcome> {
        // Idempotent replay: return the bound result without reprocessing.
        if let Some(key) = &request.idempotency_key
            && let Some(refund_id) = self.store.refund_id_for_key(key).await?
            && let Some(existing) = self.store.get_refund(&refund_id).await?
        {
            debug!(
                refund_id = %existing.refund_id,
                transaction_id = %existing.transaction_id,
                "returning replayed refund"
            );
            return Ok(RefundOutcome {
                result: existing,
                replayed: true,
            });
        }

        // Every attempt is traceable, even ones that fail validation.
        audit::record_requested(self.store.as_ref(), &request, request_id).await?;

        let transaction = match RuleValidator::new(self.store.as_ref())
            .validate(&request)
            .await
        {
            Ok(transaction) => transaction,
            Err(RefundError::Rejected(rejection)) => {
                return self.reject(&request, request_id, rejection).await;
            }
            Err(other) => return Err(other),
        };

        let already_refunded = self.store.total_refunded(&transaction.id).await?;
        let breakdown = match select_scenario(&transaction, &request, already_refunded) {
            Ok(breakdown) => breakdown,
            Err(guard) => {
                let rejection = Rejection::new(RejectCode::CalculationError, guard.to_string());
                return self.reject(&request, request_id, rejection).await;
            }
        };

        // Authoritative balance check; the validator's estimate is only a
        // fast-fail mirror of this.
        let remaining = transaction.total - already_refunded;
        if breakdown.total_refund() > remaining {
            let rejection = balance_exceeded(&transaction, breakdown.total_refund(), remaining);
            return self.reject(&request, request_id, rejection).await;
        }

        let result = RefundResult::approved(&transaction, &request, breakdown);
        match self.store.save_refund(result.clone()).await {
            Ok(()) => {}
            Err(StoreError::FullRefundExists {
                transaction_id,
                existing_refund_id,
            }) => {
                let rejection = Rejection::with_details(
                    RejectCode::DuplicateRefund,
                    format!("A full refund already exists for transaction {transaction_id}"),
                    json!({ "existing_refund_id": existing_refund_id }),
                );
                return self.reject(&request, request_id, rejection).await;
            }
            Err(StoreError::BalanceExceeded {
                attempted,
                remaining,
            }) => {
                let rejection = balance_exceeded(&transaction, attempted, remaining);
                return self.reject(&request, request_id, rejection).await;
            }
            Err(StoreError::KeyAlreadyBound { refund_id }) => {
                // Lost a same-key race after validation; surface the winner.
                if let Some(existing) = self.store.get_refund(&refund_id).await? {
                    debug!(refund_id = %existing.refund_id, "key bound concurrently, replaying");
                    return Ok(RefundOutcome {
                        result: existing,
                        replayed: true,
                    });
                }
                return Err(StoreError::KeyAlreadyBound { refund_id }.into());
            }
            Err(other) => return Err(other.into()),
        }

        audit::record_approved(self.store.as_ref(), &result, request_id).await?;
        info!(
            refund_id = %result.refund_id,
            transaction_id = %result.transaction_id,
            amount = %result.total_refund_amount,
            currency = %result.currency,
            "refund approved"
        );

        Ok(RefundOutcome {
            result,
            replayed: false,
        })
    }

    async fn reject(
        &self,
        request: &RefundRequest,
        request_id: &str,
        rejection: Rejection,
    ) -> Result<RefundOutcome> {
        warn!(
            transaction_id = %request.transaction_id,
            code = rejection.code.as_str(),
            "refund rejected"
        );
        audit::record_rejected(
            self.store.as_ref(),
            &request.transaction_id,
            &request.operator_id,
            request_id,
            &rejection,
        )
        .await?;
        Err(rejection.into())
    }

    pub async fn get_refund(&self, refund_id: &str) -> Result<Option<RefundResult>> {
        Ok(self.store.get_refund(refund_id).await?)
    }

    pub async fn list_refunds(&self, transaction_id: Option<&str>) -> Result<Vec<RefundResult>> {
        match transaction_id {
            Some(id) => Ok(self.store.refunds_for_transaction(id).await?),
            None => Ok(self.store.list_refunds().await?),
        }
    }

    pub async fn get_transaction(&self, transaction_id: &str) -> Result<Option<Transaction>> {
        Ok(self.store.get_transaction(transaction_id).await?)
    }

    pub async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.store.list_transactions().await?)
    }

    pub async fn audit_entries(
        &self,
        transaction_id: Option<&str>,
        refund_id: Option<&str>,
    ) -> Result<Vec<AuditEntry>> {
        Ok(self.store.audit_entries(transaction_id, refund_id).await?)
    }

    pub fn store(&self) -> &dyn RefundStore {
        self.store.as_ref()
    }
}

/// Scenario precedence: cross-border beats everything; an installment plan
/// with no item subset routes to the installment scenario; an item subset
/// routes to partial; everything else is a full refund.
fn select_scenario(
    transaction: &Transaction,
    request: &RefundRequest,
    already_refunded: Decimal,
) -> std::result::Result<Breakdown, engine::CalcError> {
    if transaction.is_cross_border {
        return engine::cross_border_refund(transaction, request.item_ids.as_deref());
    }
    if transaction.has_installments() && request.item_ids.is_none() {
        return engine::installment_refund(transaction, already_refunded);
    }
    if let Some(item_ids) = &request.item_ids {
        return engine::partial_refund(transaction, item_ids);
    }
    engine::full_refund(transaction)
}

fn balance_exceeded(transaction: &Transaction, attempted: Decimal, remaining: Decimal) -> Rejection {
    Rejection::with_details(
        RejectCode::RefundAmountExceeded,
        format!(
            "Calculated refund {} {} exceeds remaining refundable balance {} {}",
            attempted, transaction.currency, remaining, transaction.currency
        ),
        json!({
            "calculated_refund": attempted.to_string(),
            "remaining_balance": remaining.to_string(),
        }),
    )
}
