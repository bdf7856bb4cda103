use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

const SEED: &str = r#"[{
    "id": "TXN-1",
    "status": "CAPTURED",
    "currency": "BRL",
    "subtotal": "50.00",
    "tax": "9.00",
    "shipping": "5.00",
    "total": "64.00",
    "items": [
        {"id": "ITEM-A", "name": "Item A", "unit_price": "30.00", "quantity": 1},
        {"id": "ITEM-B", "name": "Item B", "unit_price": "10.00", "quantity": 2}
    ],
    "payments": [
        {"id": "PAY-1", "type": "CARD", "amount": "64.00", "currency": "BRL", "card_last4": "4242"}
    ],
    "merchant_id": "MERCHANT-1"
}]"#;

fn seed_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{SEED}").unwrap();
    file
}

fn requests_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "transaction_id,item_ids,operator_id,reason,idempotency_key").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}

#[test]
fn test_full_refund_flow() {
    let seed = seed_file();
    let requests = requests_file(&["TXN-1,,op-1,customer returned goods,"]);

    let mut cmd = Command::new(cargo_bin!("refund-engine"));
    cmd.arg(seed.path()).arg(requests.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "refund_id,transaction_id,status,total_refund,currency,replayed",
        ))
        .stdout(predicate::str::contains("TXN-1,APPROVED,64.00,BRL,false"));
}

#[test]
fn test_partial_refund_flow() {
    let seed = seed_file();
    let requests = requests_file(&["TXN-1,ITEM-A,op-1,item damaged,"]);

    let mut cmd = Command::new(cargo_bin!("refund-engine"));
    cmd.arg(seed.path()).arg(requests.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("TXN-1,APPROVED,38.40,BRL,false"));
}

#[test]
fn test_duplicate_full_refund_rejected() {
    let seed = seed_file();
    let requests = requests_file(&[
        "TXN-1,,op-1,customer returned goods,",
        "TXN-1,,op-1,customer returned goods,",
    ]);

    let mut cmd = Command::new(cargo_bin!("refund-engine"));
    cmd.arg(seed.path()).arg(requests.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("APPROVED").count(1))
        .stderr(predicate::str::contains("DUPLICATE_REFUND"));
}

#[test]
fn test_idempotent_replay_marks_row() {
    let seed = seed_file();
    let requests = requests_file(&[
        "TXN-1,,op-1,customer returned goods,KEY-1",
        "TXN-1,,op-1,customer returned goods,KEY-1",
    ]);

    let mut cmd = Command::new(cargo_bin!("refund-engine"));
    cmd.arg(seed.path()).arg(requests.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("64.00,BRL,false"))
        .stdout(predicate::str::contains("64.00,BRL,true"));
}

#[test]
fn test_unknown_transaction_reported_on_stderr() {
    let seed = seed_file();
    let requests = requests_file(&["TXN-404,,op-1,no such transaction,"]);

    let mut cmd = Command::new(cargo_bin!("refund-engine"));
    cmd.arg(seed.path()).arg(requests.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("TRANSACTION_NOT_FOUND"));
}

#[test]
fn test_malformed_request_row_is_skipped() {
    let seed = seed_file();
    let requests = requests_file(&[
        "txn-lowercase,,op-1,bad id,",
        "TXN-1,,op-1,customer returned goods,",
    ]);

    let mut cmd = Command::new(cargo_bin!("refund-engine"));
    cmd.arg(seed.path()).arg(requests.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("INVALID_REQUEST"))
        .stdout(predicate::str::contains("TXN-1,APPROVED,64.00,BRL,false"));
}
