//! Data models for the marketplace client

pub mod market;
pub mod property;
pub mod submission;

// Re-export for convenience
pub use market::{ListingChange, MarketDiff, MarketSnapshot};
pub use property::{AssetHolding, OwnedHolding, Property};
pub use submission::{
    AssetOptIn, BoxRef, GroupOutcome, ListingRequest, PaymentParams, PurchaseCall, PurchaseGroup,
    SubmissionEvent, SubmissionState,
};
