use std::io::Read;

use crate::domain::transaction::Transaction;
use crate::error::{RefundError, Result};

/// Loads seed transactions from a JSON array, enforcing the structural
/// invariants the engine assumes but does not re-verify.
pub fn load_transactions<R: Read>(source: R) -> Result<Vec<Transaction>> {
    let transactions: Vec<Transaction> = serde_json::from_reader(source)?;
    for transaction in &transactions {
        transaction
            .validate()
            .map_err(RefundError::InvalidTransaction)?;
    }
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const VALID: &str = r#"[{
        "id": "TXN-1",
        "status": "CAPTURED",
        "currency": "BRL",
        "subtotal": "50.00",
        "tax": "9.00",
        "shipping": "5.00",
        "total": "64.00",
        "items": [
            {"id": "ITEM-A", "name": "Item A", "unit_price": "30.00", "quantity": 1}
        ],
        "payments": [
            {"id": "PAY-1", "type": "CARD", "amount": "64.00", "currency": "BRL"}
        ],
        "merchant_id": "MERCHANT-1"
    }]"#;

    #[test]
    fn test_load_valid_transactions() {
        let transactions = load_transactions(VALID.as_bytes()).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].id, "TXN-1");
        assert_eq!(transactions[0].total, dec!(64.00));
    }

    #[test]
    fn test_load_rejects_invalid_invariants() {
        let zero_total = VALID.replace("\"total\": \"64.00\"", "\"total\": \"0.00\"");
        let err = load_transactions(zero_total.as_bytes()).unwrap_err();
        assert!(matches!(err, RefundError::InvalidTransaction(_)));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        assert!(load_transactions(&b"not json"[..]).is_err());
    }
}
