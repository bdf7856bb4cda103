use clap::Parser;
use miette::{IntoDiagnostic, Result};
use refund_engine::application::service::RefundService;
use refund_engine::domain::ports::RefundStoreRef;
use refund_engine::infrastructure::in_memory::InMemoryStore;
use refund_engine::interfaces::csv::outcome_writer::OutcomeWriter;
use refund_engine::interfaces::csv::request_reader::RequestReader;
use refund_engine::interfaces::json::transaction_loader::load_transactions;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seed transactions JSON file
    transactions: PathBuf,

    /// Refund requests CSV file
    requests: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let store: RefundStoreRef = Arc::new(InMemoryStore::new());
    let file = File::open(&cli.transactions).into_diagnostic()?;
    for transaction in load_transactions(file).into_diagnostic()? {
        store.save_transaction(transaction).await.into_diagnostic()?;
    }

    let service = RefundService::new(store);

    let file = File::open(&cli.requests).into_diagnostic()?;
    let reader = RequestReader::new(file);
    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());

    for row_result in reader.requests() {
        match row_result {
            Ok(row) => match row.into_request() {
                Ok(request) => {
                    let request_id = Uuid::new_v4().to_string();
                    match service.process_refund(request, &request_id).await {
                        Ok(outcome) => writer.write_outcome(&outcome).into_diagnostic()?,
                        Err(e) => eprintln!("Error processing refund: {}", e),
                    }
                }
                Err(rejection) => eprintln!("Error validating request: {}", rejection),
            },
            Err(e) => eprintln!("Error reading request: {}", e),
        }
    }

    writer.flush().into_diagnostic()?;
    Ok(())
}
