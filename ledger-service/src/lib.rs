//! Ledger service for deposits, withdrawals, and system fund balances

pub mod config;
pub mod repository;
pub mod service;

pub use config::LedgerServiceConfig;
pub use repository::{InMemoryLedgerRepository, LedgerRepository, PostgresLedgerRepository};
pub use service::{LedgerService, NewTransfer, RepositoryType};
