use async_trait::async_trait;

use crate::error::MarketError;
use crate::models::market::MarketDiff;
use crate::models::property::OwnedHolding;
use crate::models::submission::SubmissionEvent;

/// Handler for market-level events.
#[async_trait]
pub trait MarketEventHandler: Send + Sync {
    /// The listing set changed between two refreshes.
    async fn on_market_change(&self, diff: MarketDiff);

    /// A listing or purchase submission completed successfully.
    async fn on_submission(&self, event: SubmissionEvent);

    /// A refresh or submission failed.
    async fn on_error(&self, error: &MarketError);
}

/// Handler for changes to the connected account's owned holdings.
#[async_trait]
pub trait HoldingEventHandler: Send + Sync {
    /// The account now owns shares of a property it did not own before.
    async fn on_holding_added(&self, holding: &OwnedHolding);

    /// The account no longer owns shares of a previously held property.
    async fn on_holding_removed(&self, holding: &OwnedHolding);
}
