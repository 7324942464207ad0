use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::MarketError;
use crate::market::holdings::HoldingsReconciler;
use crate::market::listing::ListingOrchestrator;
use crate::market::purchase::{parse_share_count, PurchaseOrchestrator};
use crate::models::market::{ListingChange, MarketDiff, MarketSnapshot};
use crate::models::property::OwnedHolding;
use crate::models::submission::{GroupOutcome, SubmissionEvent};
use crate::traits::contract_client::ContractClient;
use crate::traits::event_handler::{HoldingEventHandler, MarketEventHandler};
use crate::traits::wallet_provider::WalletProvider;
use crate::utils::helper::{format_address, micro_to_units};

/// The explicitly passed context tying one wallet session to one deployed
/// contract.
///
/// Owns the orchestrators, the cached snapshots and the refresh
/// coordination: after any successful submission both the global listing
/// set and the owned holdings are refetched from the external source of
/// truth, never patched in place, because share counts are contract-mutated
/// state that also moves under other users' purchases.
pub struct MarketSession {
    client: Arc<dyn ContractClient>,
    wallet: Arc<dyn WalletProvider>,
    event_handler: Arc<dyn MarketEventHandler>,
    holding_handlers: Vec<Arc<dyn HoldingEventHandler>>,
    listing: ListingOrchestrator,
    purchase: PurchaseOrchestrator,
    reconciler: HoldingsReconciler,
    current_snapshot: Arc<Mutex<Option<MarketSnapshot>>>,
    owned: Arc<Mutex<Vec<OwnedHolding>>>,
}

impl MarketSession {
    pub fn new(
        client: Arc<dyn ContractClient>,
        wallet: Arc<dyn WalletProvider>,
        event_handler: Arc<dyn MarketEventHandler>,
    ) -> Self {
        Self {
            listing: ListingOrchestrator::new(client.clone(), wallet.clone()),
            purchase: PurchaseOrchestrator::new(client.clone(), wallet.clone()),
            reconciler: HoldingsReconciler::new(client.clone(), wallet.clone()),
            client,
            wallet,
            event_handler,
            holding_handlers: Vec::new(),
            current_snapshot: Arc::new(Mutex::new(None)),
            owned: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a handler for owned-holding changes.
    pub fn add_holding_handler(&mut self, handler: Arc<dyn HoldingEventHandler>) {
        self.holding_handlers.push(handler);
    }

    pub fn listing(&self) -> &ListingOrchestrator {
        &self.listing
    }

    pub fn purchase(&self) -> &PurchaseOrchestrator {
        &self.purchase
    }

    pub fn wallet_address(&self) -> Option<String> {
        self.wallet.active_address()
    }

    /// Last fetched market snapshot, if any.
    pub async fn snapshot(&self) -> Option<MarketSnapshot> {
        self.current_snapshot.lock().await.clone()
    }

    /// Last reconciled owned holdings.
    pub async fn owned_holdings(&self) -> Vec<OwnedHolding> {
        self.owned.lock().await.clone()
    }

    /// List a property and resynchronize on success.
    pub async fn list_property(
        &self,
        address: &str,
        total_shares: u64,
        price_per_share: u64,
    ) -> Result<u64, MarketError> {
        let asset_id = self.listing.submit_listing(address, total_shares, price_per_share).await?;
        self.event_handler
            .on_submission(SubmissionEvent::ListingCreated {
                asset_id,
                address: address.trim().to_string(),
            })
            .await;
        self.resync_after_submission().await;
        Ok(asset_id)
    }

    /// Buy shares of a listed property and resynchronize on success.
    pub async fn buy_shares(
        &self,
        property_id: u64,
        price_per_share: u64,
        owner_address: &str,
        share_count: &str,
    ) -> Result<GroupOutcome, MarketError> {
        let outcome = self
            .purchase
            .submit_purchase(property_id, price_per_share, owner_address, share_count)
            .await?;
        let shares = parse_share_count(share_count).unwrap_or(0);
        self.event_handler
            .on_submission(SubmissionEvent::SharesPurchased {
                asset_id: property_id,
                shares,
                tx_id: outcome.tx_id.clone(),
            })
            .await;
        self.resync_after_submission().await;
        Ok(outcome)
    }

    /// Post-submission refetch. Failures are reported through the event
    /// handler; they do not undo the successful submission.
    async fn resync_after_submission(&self) {
        if let Err(err) = self.refresh_all().await {
            self.event_handler.on_error(&err).await;
        }
    }

    /// Refetch both the listing set and the owned holdings.
    pub async fn refresh_all(&self) -> Result<(), MarketError> {
        self.refresh_listings().await?;
        if self.wallet.active_address().is_some() {
            self.refresh_owned().await?;
        }
        Ok(())
    }

    /// Refetch the global listing set, replace the cached snapshot and
    /// report the difference.
    pub async fn refresh_listings(&self) -> Result<MarketDiff, MarketError> {
        let listings = self.client.listed_properties().await?;
        let new_snapshot = MarketSnapshot::new(listings);

        let mut current = self.current_snapshot.lock().await;
        let diff = match current.as_ref() {
            Some(old) => Self::compare_snapshots(old, &new_snapshot),
            None => MarketDiff::new(),
        };
        *current = Some(new_snapshot);
        drop(current);

        if !diff.is_empty() {
            self.event_handler.on_market_change(diff.clone()).await;
        }
        Ok(diff)
    }

    /// Recompute the owned holdings, replace the cache and notify holding
    /// handlers about entries that appeared or disappeared.
    pub async fn refresh_owned(&self) -> Result<Vec<OwnedHolding>, MarketError> {
        let fresh = self.reconciler.owned_properties().await?;

        let mut owned = self.owned.lock().await;
        let previous = std::mem::replace(&mut *owned, fresh.clone());
        drop(owned);

        for holding in &fresh {
            if !previous.iter().any(|old| old.asset_id == holding.asset_id) {
                for handler in &self.holding_handlers {
                    let handler = handler.clone();
                    let holding = holding.clone();
                    tokio::spawn(async move {
                        handler.on_holding_added(&holding).await;
                    });
                }
            }
        }
        for holding in &previous {
            if !fresh.iter().any(|new| new.asset_id == holding.asset_id) {
                for handler in &self.holding_handlers {
                    let handler = handler.clone();
                    let holding = holding.clone();
                    tokio::spawn(async move {
                        handler.on_holding_removed(&holding).await;
                    });
                }
            }
        }

        Ok(fresh)
    }

    fn compare_snapshots(old: &MarketSnapshot, new: &MarketSnapshot) -> MarketDiff {
        let mut diff = MarketDiff::new();

        for (asset_id, property) in &new.listings {
            match old.get(*asset_id) {
                Some(previous) => {
                    if previous.available_shares != property.available_shares {
                        diff.changes.push(ListingChange {
                            asset_id: *asset_id,
                            address: property.address.clone(),
                            old_available: previous.available_shares,
                            new_available: property.available_shares,
                        });
                    }
                }
                None => diff.listed.push(property.clone()),
            }
        }

        for (asset_id, property) in &old.listings {
            if new.get(*asset_id).is_none() {
                diff.delisted.push(property.clone());
            }
        }

        diff
    }

    /// Log a one-shot overview of the market and the connected account.
    pub async fn log_market_overview(&self) -> Result<(), MarketError> {
        self.refresh_listings().await?;
        let snapshot = self.snapshot().await.unwrap_or_else(|| MarketSnapshot::new(Vec::new()));

        info!("{}", "=".repeat(72));
        info!("MARKET OVERVIEW (app {})", self.client.app_id());
        info!("{}", "-".repeat(72));
        info!("Listed properties: {}", snapshot.listing_count());
        for (asset_id, property) in &snapshot.listings {
            info!(
                "  {} \"{}\" {}/{} shares open at {:.6} per share",
                asset_id,
                property.address,
                property.available_shares,
                property.total_shares,
                micro_to_units(property.price_per_share)
            );
        }
        info!(
            "Open market value: {:.6}",
            micro_to_units(snapshot.open_market_value_micro())
        );

        if let Some(address) = self.wallet.active_address() {
            let owned = self.refresh_owned().await?;
            info!("{}", "-".repeat(72));
            info!("Holdings of {}:", format_address(&address));
            if owned.is_empty() {
                info!("  no shares of any listed property");
            }
            for holding in &owned {
                info!(
                    "  {} share(s) of \"{}\" (asset {}), value {:.6}",
                    holding.shares_owned,
                    holding.property.address,
                    holding.asset_id,
                    micro_to_units(holding.value_micro())
                );
            }
        }
        info!("{}", "=".repeat(72));
        Ok(())
    }

    /// Poll the external state on a fixed cadence, reporting changes and
    /// errors through the handlers. Runs until the task is dropped.
    pub async fn watch(&self, tick_interval_ms: u64) -> Result<(), MarketError> {
        info!("watching market with a {}ms refresh interval", tick_interval_ms);

        let mut timedelta = Instant::now();
        loop {
            let sleep_ms = tick_interval_ms as i128 - timedelta.elapsed().as_millis() as i128;
            if sleep_ms > 0 {
                tokio::time::sleep(Duration::from_millis(sleep_ms as u64)).await;
            }
            timedelta = Instant::now();

            match self.refresh_all().await {
                Ok(()) => debug!("refresh tick completed"),
                Err(err) => self.event_handler.on_error(&err).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::console::ConsoleEventHandler;
    use crate::providers::memory_client::MemoryContractClient;
    use crate::providers::wallet::MemoryWallet;

    fn session(client: Arc<MemoryContractClient>) -> MarketSession {
        MarketSession::new(
            client,
            Arc::new(MemoryWallet::connected("BUYER")),
            Arc::new(ConsoleEventHandler::new()),
        )
    }

    #[tokio::test]
    async fn refresh_diffs_listings_between_polls() {
        let client = Arc::new(MemoryContractClient::new(7));
        let session = session(client.clone());

        let first = session.refresh_listings().await.unwrap();
        assert!(first.is_empty());

        let other = ListingOrchestrator::new(
            client.clone(),
            Arc::new(MemoryWallet::connected("OWNER")),
        );
        let asset_id = other.submit_listing("9 Dock Road", 10, 100).await.unwrap();

        let second = session.refresh_listings().await.unwrap();
        assert_eq!(second.listed.len(), 1);
        assert_eq!(second.listed[0].asset_id, asset_id);
        assert!(second.changes.is_empty());
    }

    #[tokio::test]
    async fn successful_purchase_triggers_a_refetch_of_both_sides() {
        let client = Arc::new(MemoryContractClient::new(7));
        let session = session(client.clone());
        client.fund("BUYER", 10_000).await;

        let other = ListingOrchestrator::new(
            client.clone(),
            Arc::new(MemoryWallet::connected("OWNER")),
        );
        let asset_id = other.submit_listing("9 Dock Road", 10, 100).await.unwrap();

        session.refresh_all().await.unwrap();
        let (listings_before, holdings_before) = client.fetch_counts();

        session.buy_shares(asset_id, 100, "OWNER", "2").await.unwrap();

        let (listings_after, holdings_after) = client.fetch_counts();
        assert!(listings_after > listings_before, "listings must be refetched");
        assert!(holdings_after > holdings_before, "holdings must be refetched");

        let owned = session.owned_holdings().await;
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].shares_owned, 2);
    }

    #[tokio::test]
    async fn available_share_movement_shows_up_as_a_change() {
        let client = Arc::new(MemoryContractClient::new(7));
        let session = session(client.clone());
        client.fund("RIVAL", 10_000).await;

        let owner = ListingOrchestrator::new(
            client.clone(),
            Arc::new(MemoryWallet::connected("OWNER")),
        );
        let asset_id = owner.submit_listing("9 Dock Road", 10, 100).await.unwrap();
        session.refresh_listings().await.unwrap();

        // A rival buyer races us between polls.
        let rival = PurchaseOrchestrator::new(
            client.clone(),
            Arc::new(MemoryWallet::connected("RIVAL")),
        );
        rival.submit_purchase(asset_id, 100, "OWNER", "4").await.unwrap();

        let diff = session.refresh_listings().await.unwrap();
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].shares_moved(), -4);
    }
}
