//! End-to-end marketplace flows over the in-memory simulator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use estate_market::handlers::ConsoleHoldingHandler;
use estate_market::models::market::MarketDiff;
use estate_market::models::property::OwnedHolding;
use estate_market::models::submission::{ListingRequest, SubmissionEvent};
use estate_market::providers::{MemoryContractClient, MemoryWallet};
use estate_market::traits::{ContractClient, HoldingEventHandler, MarketEventHandler};
use estate_market::{MarketError, MarketSession};

/// Event handler that records everything it sees.
#[derive(Default)]
struct RecordingHandler {
    submissions: Mutex<Vec<SubmissionEvent>>,
    market_changes: AtomicUsize,
    errors: Mutex<Vec<String>>,
}

#[async_trait]
impl MarketEventHandler for RecordingHandler {
    async fn on_market_change(&self, _diff: MarketDiff) {
        self.market_changes.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_submission(&self, event: SubmissionEvent) {
        self.submissions.lock().await.push(event);
    }

    async fn on_error(&self, error: &MarketError) {
        self.errors.lock().await.push(error.to_string());
    }
}

#[derive(Default)]
struct RecordingHoldingHandler {
    added: AtomicUsize,
    removed: AtomicUsize,
}

#[async_trait]
impl HoldingEventHandler for RecordingHoldingHandler {
    async fn on_holding_added(&self, _holding: &OwnedHolding) {
        self.added.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_holding_removed(&self, _holding: &OwnedHolding) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }
}

async fn seed_listing(client: &MemoryContractClient, shares: u64, price: u64) -> u64 {
    client
        .create_listing(ListingRequest {
            sender: "OWNER".to_string(),
            address: "9 Dock Road".to_string(),
            total_shares: shares,
            price_per_share: price,
            extra_fee_micro: 0,
        })
        .await
        .expect("seeding the listing should succeed")
}

fn buyer_session(
    client: Arc<MemoryContractClient>,
    handler: Arc<RecordingHandler>,
) -> MarketSession {
    MarketSession::new(client, Arc::new(MemoryWallet::connected("BUYER")), handler)
}

#[tokio::test]
async fn listing_then_purchase_updates_owned_holdings() {
    let client = Arc::new(MemoryContractClient::new(7));
    let handler = Arc::new(RecordingHandler::default());
    let session = buyer_session(client.clone(), handler.clone());
    client.fund("BUYER", 10_000_000).await;

    let asset_id = session.list_property("9 Dock Road", 50, 1_000).await.unwrap();
    session.buy_shares(asset_id, 1_000, "BUYER", "5").await.unwrap();

    let owned = session.owned_holdings().await;
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].asset_id, asset_id);
    assert_eq!(owned[0].shares_owned, 5);
    assert_eq!(owned[0].property.available_shares, 45);

    let submissions = handler.submissions.lock().await;
    assert!(matches!(submissions[0], SubmissionEvent::ListingCreated { .. }));
    assert!(
        matches!(submissions[1], SubmissionEvent::SharesPurchased { shares: 5, .. })
    );
}

#[tokio::test]
async fn successful_purchase_refetches_instead_of_patching() {
    let client = Arc::new(MemoryContractClient::new(7));
    let handler = Arc::new(RecordingHandler::default());
    let session = buyer_session(client.clone(), handler);
    client.fund("BUYER", 10_000_000).await;

    let asset_id = seed_listing(&client, 50, 1_000).await;
    session.refresh_all().await.unwrap();
    let (listings_before, holdings_before) = client.fetch_counts();

    session.buy_shares(asset_id, 1_000, "OWNER", "2").await.unwrap();

    let (listings_after, holdings_after) = client.fetch_counts();
    assert!(listings_after > listings_before);
    assert!(holdings_after > holdings_before);
}

#[tokio::test]
async fn failed_purchase_does_not_resync() {
    let client = Arc::new(MemoryContractClient::new(7));
    let handler = Arc::new(RecordingHandler::default());
    let session = buyer_session(client.clone(), handler.clone());
    client.fund("BUYER", 10_000_000).await;

    let asset_id = seed_listing(&client, 50, 1_000).await;
    session.refresh_all().await.unwrap();
    let (listings_before, holdings_before) = client.fetch_counts();

    client.fail_next_submission();
    let err = session.buy_shares(asset_id, 1_000, "OWNER", "2").await.unwrap_err();
    assert!(matches!(err, MarketError::Transport(_)));

    assert_eq!(client.fetch_counts(), (listings_before, holdings_before));
    assert!(handler.submissions.lock().await.is_empty());
}

#[tokio::test]
async fn contract_decline_is_atomic_and_surfaced_as_rejection() {
    let client = Arc::new(MemoryContractClient::new(7));
    let handler = Arc::new(RecordingHandler::default());
    let session = buyer_session(client.clone(), handler);
    client.fund("BUYER", 10_000_000).await;

    let asset_id = seed_listing(&client, 50, 1_000).await;
    client.decline_next_purchase();

    let err = session.buy_shares(asset_id, 1_000, "OWNER", "3").await.unwrap_err();
    assert!(matches!(err, MarketError::PurchaseRejected { .. }));

    // Nothing from the group may have committed.
    assert_eq!(client.holding_of("BUYER", asset_id).await, 0);
    assert!(!client.is_opted_in("BUYER", asset_id).await);
    assert_eq!(client.balance_of("BUYER").await, 10_000_000);
}

#[tokio::test]
async fn disconnected_wallet_keeps_everything_offline() {
    let client = Arc::new(MemoryContractClient::new(7));
    let handler = Arc::new(RecordingHandler::default());
    let session = MarketSession::new(
        client.clone(),
        Arc::new(MemoryWallet::new("BUYER")),
        handler,
    );

    let err = session.list_property("9 Dock Road", 50, 1_000).await.unwrap_err();
    assert!(matches!(err, MarketError::NotReady(_)));

    let err = session.buy_shares(1, 1_000, "OWNER", "1").await.unwrap_err();
    assert!(matches!(err, MarketError::NotReady(_)));

    assert_eq!(client.submission_count(), 0);
}

#[tokio::test]
async fn holding_handlers_fire_when_ownership_appears() {
    let client = Arc::new(MemoryContractClient::new(7));
    let handler = Arc::new(RecordingHandler::default());
    let holding_handler = Arc::new(RecordingHoldingHandler::default());

    let mut session = buyer_session(client.clone(), handler);
    session.add_holding_handler(holding_handler.clone());
    session.add_holding_handler(Arc::new(ConsoleHoldingHandler::new()));
    client.fund("BUYER", 10_000_000).await;

    let asset_id = seed_listing(&client, 50, 1_000).await;
    session.buy_shares(asset_id, 1_000, "OWNER", "2").await.unwrap();

    // Holding notifications run on spawned tasks; give them a beat.
    tokio::task::yield_now().await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(holding_handler.added.load(Ordering::SeqCst), 1);
    assert_eq!(holding_handler.removed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn racing_buyers_are_arbitrated_by_the_contract() {
    let client = Arc::new(MemoryContractClient::new(7));
    let first = buyer_session(client.clone(), Arc::new(RecordingHandler::default()));
    let second = MarketSession::new(
        client.clone(),
        Arc::new(MemoryWallet::connected("RIVAL")),
        Arc::new(RecordingHandler::default()),
    );
    client.fund("BUYER", 10_000_000).await;
    client.fund("RIVAL", 10_000_000).await;

    let asset_id = seed_listing(&client, 5, 1_000).await;

    // The rival exhausts the pool; our stale snapshot said 5 were open.
    second.buy_shares(asset_id, 1_000, "OWNER", "5").await.unwrap();
    let err = first.buy_shares(asset_id, 1_000, "OWNER", "3").await.unwrap_err();
    assert!(err.to_string().contains("Not enough shares available"));

    // The refetch shows the truth.
    first.refresh_all().await.unwrap();
    let snapshot = first.snapshot().await.unwrap();
    assert_eq!(snapshot.get(asset_id).unwrap().available_shares, 0);
}
