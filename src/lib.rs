//! Marketplace Client Library
//!
//! A modular client for a fractional-ownership marketplace running on an
//! Algorand-style smart-contract platform. The contract itself is external;
//! this crate orchestrates listings and atomic share purchases against it,
//! reconciles the connected account's holdings, and keeps derived state in
//! sync by refetching after every accepted submission.

// Public modules - these are the API surface
pub mod donation;
pub mod error;
pub mod handlers;
pub mod market;
pub mod models;
pub mod notifications;
pub mod providers;
pub mod traits;
pub mod utils;

// Re-export commonly used items for easier access
pub use error::MarketError;
pub use models::{
    market::{ListingChange, MarketDiff, MarketSnapshot},
    property::{AssetHolding, OwnedHolding, Property},
    submission::{GroupOutcome, ListingRequest, PurchaseGroup, SubmissionEvent, SubmissionState},
};
pub use traits::{
    contract_client::ContractClient,
    event_handler::{HoldingEventHandler, MarketEventHandler},
    wallet_provider::{TransactionSigner, WalletProvider},
};
pub use providers::{
    gateway_client::{GatewayClient, GatewayConfig},
    memory_client::MemoryContractClient,
    wallet::{DaemonWallet, MemoryWallet},
};
pub use handlers::{
    composite::CompositeEventHandler,
    console::ConsoleEventHandler,
    webhook::{WebhookEventHandler, WebhookNotifier},
};
pub use market::{
    holdings::{reconcile, HoldingsReconciler},
    listing::ListingOrchestrator,
    purchase::{validate_share_count, PurchaseOrchestrator},
    session::MarketSession,
};
pub use notifications::NotificationQueue;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type alias for library functions
pub type Result<T> = std::result::Result<T, MarketError>;
