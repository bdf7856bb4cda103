use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::domain::audit::AuditEntry;
use crate::domain::refund::RefundResult;
use crate::domain::transaction::Transaction;
use crate::error::StoreError;

pub type RefundStoreRef = Arc<dyn RefundStore>;

/// Storage port for the refund pipeline. Implementations must make every
/// method atomic with respect to each other; `save_refund` additionally
/// re-verifies the balance and duplicate-full-refund invariants and binds
/// the idempotency key inside the same critical section, so at most one
/// approved refund can win a race.
#[async_trait]
pub trait RefundStore: Send + Sync {
    async fn save_transaction(&self, transaction: Transaction) -> Result<(), StoreError>;
    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<Transaction>, StoreError>;
    async fn list_transactions(&self) -> Result<Vec<Transaction>, StoreError>;

    /// Insert-only. Fails with a conflict variant instead of overwriting or
    /// breaking the refund invariants.
    async fn save_refund(&self, refund: RefundResult) -> Result<(), StoreError>;
    async fn get_refund(&self, refund_id: &str) -> Result<Option<RefundResult>, StoreError>;
    async fn list_refunds(&self) -> Result<Vec<RefundResult>, StoreError>;
    async fn refunds_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Vec<RefundResult>, StoreError>;

    /// Sum of all persisted refund amounts for the transaction.
    async fn total_refunded(&self, transaction_id: &str) -> Result<Decimal, StoreError>;

    /// Id of a prior refund whose breakdown covers the whole transaction
    /// (no item subset, no installment schedule, amount >= total), if any.
    async fn existing_full_refund(
        &self,
        transaction_id: &str,
    ) -> Result<Option<String>, StoreError>;

    /// The refund an idempotency key is bound to, if the key has been used.
    /// Keys are bound once and never remapped.
    async fn refund_id_for_key(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn append_audit(&self, entry: AuditEntry) -> Result<(), StoreError>;
    async fn audit_entries(
        &self,
        transaction_id: Option<&str>,
        refund_id: Option<&str>,
    ) -> Result<Vec<AuditEntry>, StoreError>;
}
