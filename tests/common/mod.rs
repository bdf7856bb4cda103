#![allow(dead_code)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use refund_engine::application::service::RefundService;
use refund_engine::domain::ports::RefundStoreRef;
use refund_engine::domain::refund::RefundRequest;
use refund_engine::domain::transaction::{
    Item, PaymentMethod, PaymentMethodType, Transaction, TransactionStatus,
};
use refund_engine::infrastructure::in_memory::InMemoryStore;

pub fn card(id: &str, amount: Decimal) -> PaymentMethod {
    PaymentMethod {
        id: id.to_string(),
        r#type: PaymentMethodType::Card,
        amount,
        currency: "BRL".into(),
        installments_total: None,
        installments_charged: None,
        card_last4: Some("4242".into()),
    }
}

pub fn wallet(id: &str, amount: Decimal) -> PaymentMethod {
    PaymentMethod {
        id: id.to_string(),
        r#type: PaymentMethodType::Wallet,
        amount,
        currency: "BRL".into(),
        installments_total: None,
        installments_charged: None,
        card_last4: None,
    }
}

/// subtotal=50.00, tax=9.00, shipping=5.00, total=64.00,
/// items A (30.00) and B (2 x 10.00), one card payment.
pub fn captured_transaction(id: &str) -> Transaction {
    Transaction {
        id: id.to_string(),
        status: TransactionStatus::Captured,
        currency: "BRL".into(),
        subtotal: dec!(50.00),
        tax: dec!(9.00),
        shipping: dec!(5.00),
        total: dec!(64.00),
        items: vec![
            Item {
                id: "ITEM-A".into(),
                name: "Item A".into(),
                unit_price: dec!(30.00),
                quantity: 1,
            },
            Item {
                id: "ITEM-B".into(),
                name: "Item B".into(),
                unit_price: dec!(10.00),
                quantity: 2,
            },
        ],
        payments: vec![card("PAY-1", dec!(64.00))],
        exchange_rate_to_usd: None,
        is_cross_border: false,
        merchant_id: "MERCHANT-1".into(),
    }
}

pub fn split_transaction(id: &str) -> Transaction {
    let mut txn = captured_transaction(id);
    txn.payments = vec![card("PAY-1", dec!(38.40)), wallet("PAY-2", dec!(25.60))];
    txn
}

pub fn installment_transaction(id: &str, total: u32, charged: u32) -> Transaction {
    let mut txn = captured_transaction(id);
    let mut payment = card("PAY-1", dec!(64.00));
    payment.installments_total = Some(total);
    payment.installments_charged = Some(charged);
    txn.payments = vec![payment];
    txn
}

pub fn cross_border_transaction(id: &str, rate: Decimal) -> Transaction {
    let mut txn = captured_transaction(id);
    txn.is_cross_border = true;
    txn.exchange_rate_to_usd = Some(rate);
    txn
}

pub fn full_refund_request(transaction_id: &str) -> RefundRequest {
    RefundRequest {
        transaction_id: transaction_id.to_string(),
        item_ids: None,
        operator_id: "op-1".into(),
        reason: "customer returned the goods".into(),
        idempotency_key: None,
    }
}

pub fn partial_refund_request(transaction_id: &str, item_ids: &[&str]) -> RefundRequest {
    RefundRequest {
        item_ids: Some(item_ids.iter().map(|id| id.to_string()).collect()),
        ..full_refund_request(transaction_id)
    }
}

pub fn keyed_request(transaction_id: &str, key: &str) -> RefundRequest {
    RefundRequest {
        idempotency_key: Some(key.to_string()),
        ..full_refund_request(transaction_id)
    }
}

/// Builds a service over a fresh in-memory store seeded with the given
/// transactions, returning both so tests can inspect the store directly.
pub async fn service_with(transactions: Vec<Transaction>) -> (RefundService, RefundStoreRef) {
    let store: RefundStoreRef = Arc::new(InMemoryStore::new());
    for transaction in transactions {
        store.save_transaction(transaction).await.unwrap();
    }
    (RefundService::new(store.clone()), store)
}
