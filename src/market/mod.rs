//! Orchestration core: listing, purchase, reconciliation, session state

pub mod holdings;
pub mod listing;
pub mod purchase;
pub mod session;

pub use holdings::{reconcile, HoldingsReconciler};
pub use listing::ListingOrchestrator;
pub use purchase::{
    box_key, parse_share_count, validate_share_count, PurchaseOrchestrator,
};
pub use session::MarketSession;
