use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing::level_filters::LevelFilter;

use estate_market::handlers::{
    CompositeEventHandler, ConsoleEventHandler, ConsoleHoldingHandler, WebhookEventHandler,
    WebhookNotifier,
};
use estate_market::models::submission::ListingRequest;
use estate_market::notifications::NotificationQueue;
use estate_market::providers::{DaemonWallet, GatewayClient, GatewayConfig, MemoryContractClient, MemoryWallet};
use estate_market::traits::{ContractClient, WalletProvider};
use estate_market::MarketSession;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_level(true)
        .with_target(false)
        .with_max_level(LevelFilter::INFO)
        .init();

    dotenvy::dotenv().ok();

    tokio::runtime::Runtime::new()?.block_on(async {
        let app_id: u64 = std::env::var("APP_ID")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(1002);

        let wallet_address = std::env::var("WALLET_ADDRESS")
            .unwrap_or_else(|_| "DEMO-BUYER".to_string());

        info!("Initializing market watcher (version {})...", estate_market::VERSION);
        info!("App id: {}", app_id);
        info!("Wallet address: {}", wallet_address);

        // Wallet: a key daemon when configured, otherwise in-memory.
        let wallet: Arc<dyn WalletProvider> = if std::env::var("SIGNER_URL").is_ok() {
            Arc::new(DaemonWallet::from_env()?)
        } else {
            info!("SIGNER_URL not set, using the in-memory wallet");
            Arc::new(MemoryWallet::new(wallet_address.clone()))
        };
        wallet.connect().await.context("could not establish the wallet session")?;

        // Contract client: the gateway when configured, otherwise the
        // in-memory simulator seeded with demo listings.
        let client: Arc<dyn ContractClient> = if std::env::var("GATEWAY_URL").is_ok() {
            let config = GatewayConfig::from_env()?;
            info!("Gateway: {}", config.base_url);
            let sender = wallet.active_address().context("wallet has no active address")?;
            let signer = wallet.signer().context("wallet exposed no signer")?;
            Arc::new(GatewayClient::connect(config, app_id, sender, signer).await?)
        } else {
            info!("GATEWAY_URL not set, running against the in-memory simulator");
            let simulator = Arc::new(MemoryContractClient::new(app_id));
            simulator.fund(&wallet_address, 25_000_000).await;
            seed_demo_listings(&simulator).await?;
            simulator
        };

        // Event chain: console plus optional webhook, drained off a queue
        // so slow deliveries never stall the refresh loop.
        let mut composite = CompositeEventHandler::new();
        composite.add_handler(Arc::new(ConsoleEventHandler::new()));
        let webhook = WebhookNotifier::from_env();
        if webhook.is_enabled() {
            info!("Webhook notifications enabled");
            composite.add_handler(Arc::new(WebhookEventHandler::new(webhook)));
        }
        let queue = Arc::new(NotificationQueue::new(Arc::new(composite)));

        let mut session = MarketSession::new(client, wallet.clone(), queue.clone());
        session.add_holding_handler(Arc::new(ConsoleHoldingHandler::new()));
        let session = Arc::new(session);

        session.log_market_overview().await?;

        let tick_interval: u64 = std::env::var("TICK_INTERVAL_MS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(1100);

        let watcher = session.clone();
        let watch_task = tokio::spawn(async move { watcher.watch(tick_interval).await });

        info!("Market watcher is running. Press Ctrl+C to stop.");
        tokio::signal::ctrl_c().await?;

        info!("Shutting down...");
        watch_task.abort();
        queue.shutdown();
        wallet.disconnect().await;

        Ok(())
    })
}

/// A couple of listings so the simulator has something to show.
async fn seed_demo_listings(client: &MemoryContractClient) -> anyhow::Result<()> {
    for (address, total_shares, price_per_share) in [
        ("14 Beach Parade", 100, 250_000),
        ("3 Mill Street", 40, 900_000),
    ] {
        client
            .create_listing(ListingRequest {
                sender: "DEMO-OWNER".to_string(),
                address: address.to_string(),
                total_shares,
                price_per_share,
                extra_fee_micro: 0,
            })
            .await?;
    }
    Ok(())
}
