use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::MarketError;
use crate::models::market::MarketDiff;
use crate::models::property::OwnedHolding;
use crate::models::submission::SubmissionEvent;
use crate::traits::event_handler::{HoldingEventHandler, MarketEventHandler};
use crate::utils::helper::micro_to_units;

/// Console logging event handler
pub struct ConsoleEventHandler;

impl ConsoleEventHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketEventHandler for ConsoleEventHandler {
    async fn on_market_change(&self, diff: MarketDiff) {
        if diff.is_empty() {
            return;
        }

        info!("Market changes detected:");
        info!("{}", "-".repeat(72));

        for property in &diff.listed {
            info!(
                "  + \"{}\" (asset {}): {} shares at {:.6} per share",
                property.address,
                property.asset_id,
                property.total_shares,
                micro_to_units(property.price_per_share)
            );
        }

        for property in &diff.delisted {
            info!("  - \"{}\" (asset {}) is no longer listed", property.address, property.asset_id);
        }

        for change in &diff.changes {
            let direction = if change.shares_moved() < 0 { "sold" } else { "returned" };
            info!(
                "  ~ \"{}\" (asset {}): {} share(s) {}, {} now open",
                change.address,
                change.asset_id,
                change.shares_moved().abs(),
                direction,
                change.new_available
            );
        }

        info!("{}", "=".repeat(72));
    }

    async fn on_submission(&self, event: SubmissionEvent) {
        match event {
            SubmissionEvent::ListingCreated { asset_id, address } => {
                info!("listing confirmed: \"{}\" is now asset {}", address, asset_id);
            }
            SubmissionEvent::SharesPurchased { asset_id, shares, tx_id } => {
                info!("purchase confirmed: {} share(s) of asset {} in {}", shares, asset_id, tx_id);
            }
        }
    }

    async fn on_error(&self, error: &MarketError) {
        warn!("market session error: {}", error);
    }
}

/// Console logging handler for owned-holding changes
pub struct ConsoleHoldingHandler;

impl ConsoleHoldingHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleHoldingHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HoldingEventHandler for ConsoleHoldingHandler {
    async fn on_holding_added(&self, holding: &OwnedHolding) {
        info!(
            "now holding {} share(s) of \"{}\" (asset {})",
            holding.shares_owned, holding.property.address, holding.asset_id
        );
    }

    async fn on_holding_removed(&self, holding: &OwnedHolding) {
        info!(
            "no longer holding \"{}\" (asset {})",
            holding.property.address, holding.asset_id
        );
    }
}
