use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::audit::AuditEntry;
use crate::domain::ports::RefundStore;
use crate::domain::refund::RefundResult;
use crate::domain::transaction::Transaction;
use crate::error::StoreError;

#[derive(Default)]
struct StoreInner {
    transactions: HashMap<String, Transaction>,
    refunds: HashMap<String, RefundResult>,
    refunds_by_transaction: HashMap<String, Vec<String>>,
    idempotency_keys: HashMap<String, String>,
    audit_log: Vec<AuditEntry>,
}

impl StoreInner {
    fn total_refunded(&self, transaction_id: &str) -> Decimal {
        self.refunds_by_transaction
            .get(transaction_id)
            .into_iter()
            .flatten()
            .filter_map(|refund_id| self.refunds.get(refund_id))
            .map(|refund| refund.total_refund_amount)
            .sum()
    }

    fn existing_full_refund(&self, transaction_id: &str) -> Option<String> {
        let transaction = self.transactions.get(transaction_id)?;
        self.refunds_by_transaction
            .get(transaction_id)?
            .iter()
            .find(|refund_id| {
                self.refunds.get(*refund_id).is_some_and(|refund| {
                    refund.calculation_breakdown.is_full_shape()
                        && refund.total_refund_amount >= transaction.total
                })
            })
            .cloned()
    }
}

/// In-memory reference store. One mutex guards all state, so every exposed
/// operation is a single exclusive critical section; refund processing is
/// serialized across all transactions, trading throughput for correctness.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefundStore for InMemoryStore {
    async fn save_transaction(&self, transaction: Transaction) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.transactions.insert(transaction.id.clone(), transaction);
        Ok(())
    }

    async fn get_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Transaction>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.transactions.get(transaction_id).cloned())
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        let inner = self.inner.lock().await;
        let mut transactions: Vec<Transaction> = inner.transactions.values().cloned().collect();
        transactions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(transactions)
    }

    /// The checked insert. All duplicate/balance invariants are re-verified
    /// here, inside the same lock acquisition that performs the write, so a
    /// request racing past validation cannot also persist.
    async fn save_refund(&self, refund: RefundResult) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;

        let Some(transaction) = inner.transactions.get(&refund.transaction_id) else {
            return Err(StoreError::UnknownTransaction(refund.transaction_id));
        };
        let transaction_total = transaction.total;

        if inner.refunds.contains_key(&refund.refund_id) {
            return Err(StoreError::DuplicateRefundId(refund.refund_id));
        }

        if let Some(key) = &refund.idempotency_key
            && let Some(bound) = inner.idempotency_keys.get(key)
        {
            return Err(StoreError::KeyAlreadyBound {
                refund_id: bound.clone(),
            });
        }

        if refund.calculation_breakdown.is_full_shape()
            && refund.total_refund_amount >= transaction_total
            && let Some(existing_refund_id) = inner.existing_full_refund(&refund.transaction_id)
        {
            return Err(StoreError::FullRefundExists {
                transaction_id: refund.transaction_id,
                existing_refund_id,
            });
        }

        let remaining = transaction_total - inner.total_refunded(&refund.transaction_id);
        if refund.total_refund_amount > remaining {
            return Err(StoreError::BalanceExceeded {
                attempted: refund.total_refund_amount,
                remaining,
            });
        }

        if let Some(key) = &refund.idempotency_key {
            inner
                .idempotency_keys
                .insert(key.clone(), refund.refund_id.clone());
        }
        inner
            .refunds_by_transaction
            .entry(refund.transaction_id.clone())
            .or_default()
            .push(refund.refund_id.clone());
        inner.refunds.insert(refund.refund_id.clone(), refund);
        Ok(())
    }

    async fn get_refund(&self, refund_id: &str) -> Result<Option<RefundResult>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.refunds.get(refund_id).cloned())
    }

    async fn list_refunds(&self) -> Result<Vec<RefundResult>, StoreError> {
        let inner = self.inner.lock().await;
        let mut refunds: Vec<RefundResult> = inner.refunds.values().cloned().collect();
        refunds.sort_by_key(|refund| refund.created_at);
        Ok(refunds)
    }

    async fn refunds_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Vec<RefundResult>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .refunds_by_transaction
            .get(transaction_id)
            .into_iter()
            .flatten()
            .filter_map(|refund_id| inner.refunds.get(refund_id))
            .cloned()
            .collect())
    }

    async fn total_refunded(&self, transaction_id: &str) -> Result<Decimal, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.total_refunded(transaction_id))
    }

    async fn existing_full_refund(
        &self,
        transaction_id: &str,
    ) -> Result<Option<String>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.existing_full_refund(transaction_id))
    }

    async fn refund_id_for_key(&self, key: &str) -> Result<Option<String>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.idempotency_keys.get(key).cloned())
    }

    async fn append_audit(&self, entry: AuditEntry) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.audit_log.push(entry);
        Ok(())
    }

    async fn audit_entries(
        &self,
        transaction_id: Option<&str>,
        refund_id: Option<&str>,
    ) -> Result<Vec<AuditEntry>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .audit_log
            .iter()
            .filter(|entry| {
                transaction_id.is_none_or(|id| entry.transaction_id == id)
                    && refund_id.is_none_or(|id| entry.refund_id.as_deref() == Some(id))
            })
            .cloned()
            .collect())
    }
}
