pub mod cli;
pub mod config;
pub mod executor;
pub mod identity;
pub mod report;
pub mod scheduler;
pub mod stats;

#[cfg(test)]
mod fake;

pub use config::LoadTestConfig;
pub use executor::{LeaseTransaction, TransactionOutcome, execute_transaction};
pub use identity::ClientIdentity;
pub use scheduler::run_load_test;
pub use stats::{AggregateResult, LeaseStats};
