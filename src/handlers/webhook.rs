use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::MarketError;
use crate::models::market::MarketDiff;
use crate::models::submission::SubmissionEvent;
use crate::traits::event_handler::MarketEventHandler;

/// Posts JSON payloads to a configured webhook endpoint.
///
/// Disabled (and silent) when no URL is configured, so it can always be
/// wired into the handler chain.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Option<Client>,
    url: Option<String>,
    token: Option<String>,
}

impl WebhookNotifier {
    /// Read `WEBHOOK_URL` and optional `WEBHOOK_TOKEN` from the environment.
    pub fn from_env() -> Self {
        let url = std::env::var("WEBHOOK_URL").ok();
        let token = std::env::var("WEBHOOK_TOKEN").ok();
        let client = url.as_ref().map(|_| Client::new());
        Self { client, url, token }
    }

    pub fn new(url: impl Into<String>) -> Self {
        Self { client: Some(Client::new()), url: Some(url.into()), token: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some() && self.url.is_some()
    }

    /// Deliver one event payload. Failures are logged, never propagated:
    /// a dead webhook must not break a refresh loop.
    pub async fn send(&self, payload: serde_json::Value) {
        let (Some(client), Some(url)) = (&self.client, &self.url) else {
            return;
        };

        let mut request = client.post(url).json(&payload);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    warn!("webhook endpoint answered {}", status);
                } else {
                    debug!("webhook notification delivered");
                }
            }
            Err(err) => {
                warn!("failed to deliver webhook notification: {}", err);
            }
        }
    }
}

/// Webhook notification event handler
pub struct WebhookEventHandler {
    notifier: WebhookNotifier,
}

impl WebhookEventHandler {
    pub fn new(notifier: WebhookNotifier) -> Self {
        Self { notifier }
    }

    pub fn is_enabled(&self) -> bool {
        self.notifier.is_enabled()
    }
}

#[async_trait]
impl MarketEventHandler for WebhookEventHandler {
    async fn on_market_change(&self, diff: MarketDiff) {
        if diff.is_empty() {
            return;
        }
        let payload = json!({
            "event": "market_change",
            "listed": diff.listed.iter().map(|p| json!({
                "asset_id": p.asset_id,
                "address": p.address,
                "total_shares": p.total_shares,
                "price_per_share": p.price_per_share,
            })).collect::<Vec<_>>(),
            "delisted": diff.delisted.iter().map(|p| p.asset_id).collect::<Vec<_>>(),
            "changes": diff.changes.iter().map(|c| json!({
                "asset_id": c.asset_id,
                "old_available": c.old_available,
                "new_available": c.new_available,
            })).collect::<Vec<_>>(),
        });
        self.notifier.send(payload).await;
    }

    async fn on_submission(&self, event: SubmissionEvent) {
        let payload = match event {
            SubmissionEvent::ListingCreated { asset_id, address } => json!({
                "event": "listing_created",
                "asset_id": asset_id,
                "address": address,
            }),
            SubmissionEvent::SharesPurchased { asset_id, shares, tx_id } => json!({
                "event": "shares_purchased",
                "asset_id": asset_id,
                "shares": shares,
                "tx_id": tx_id,
            }),
        };
        self.notifier.send(payload).await;
    }

    async fn on_error(&self, error: &MarketError) {
        self.notifier
            .send(json!({
                "event": "error",
                "message": error.to_string(),
            }))
            .await;
    }
}
