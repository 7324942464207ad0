//! Core traits for the marketplace client

pub mod contract_client;
pub mod event_handler;
pub mod wallet_provider;

// Re-export for convenience
pub use contract_client::ContractClient;
pub use event_handler::{HoldingEventHandler, MarketEventHandler};
pub use wallet_provider::{TransactionSigner, WalletProvider};
