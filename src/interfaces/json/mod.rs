pub mod transaction_loader;
