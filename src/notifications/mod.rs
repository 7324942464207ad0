//! Async fan-out of events to slow handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::warn;

use crate::error::MarketError;
use crate::models::market::MarketDiff;
use crate::models::submission::SubmissionEvent;
use crate::traits::event_handler::MarketEventHandler;

/// Notification types
#[derive(Debug, Clone)]
pub enum Notification {
    MarketChange(MarketDiff),
    Submission(SubmissionEvent),
    Error(String),
    Shutdown,
}

/// Queue that decouples event production from handler IO.
///
/// Handlers doing network calls (webhooks) can lag behind a refresh loop;
/// the queue absorbs bursts and a dedicated task drains them in order. The
/// queue itself implements [`MarketEventHandler`], so it slots into the
/// handler chain wherever a direct handler would.
pub struct NotificationQueue {
    sender: UnboundedSender<Notification>,
}

impl NotificationQueue {
    pub fn new(handler: Arc<dyn MarketEventHandler>) -> Self {
        let (sender, receiver) = unbounded_channel();
        tokio::spawn(Self::process_notifications(receiver, handler));
        Self { sender }
    }

    async fn process_notifications(
        mut receiver: UnboundedReceiver<Notification>,
        handler: Arc<dyn MarketEventHandler>,
    ) {
        while let Some(notification) = receiver.recv().await {
            match notification {
                Notification::MarketChange(diff) => {
                    handler.on_market_change(diff).await;
                }
                Notification::Submission(event) => {
                    handler.on_submission(event).await;
                }
                Notification::Error(message) => {
                    handler.on_error(&MarketError::transport(message)).await;
                }
                Notification::Shutdown => {
                    warn!("notification processor shutting down");
                    break;
                }
            }
        }
    }

    fn enqueue(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            warn!("notification queue is closed; event dropped");
        }
    }

    /// Stop the processing task after the queued events drain.
    pub fn shutdown(&self) {
        self.enqueue(Notification::Shutdown);
    }
}

#[async_trait]
impl MarketEventHandler for NotificationQueue {
    async fn on_market_change(&self, diff: MarketDiff) {
        self.enqueue(Notification::MarketChange(diff));
    }

    async fn on_submission(&self, event: SubmissionEvent) {
        self.enqueue(Notification::Submission(event));
    }

    async fn on_error(&self, error: &MarketError) {
        self.enqueue(Notification::Error(error.to_string()));
    }
}
