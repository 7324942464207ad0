use std::sync::Arc;

use async_trait::async_trait;

use crate::error::MarketError;
use crate::models::market::MarketDiff;
use crate::models::submission::SubmissionEvent;
use crate::traits::event_handler::MarketEventHandler;

/// Composite event handler that fans events out to multiple handlers
pub struct CompositeEventHandler {
    handlers: Vec<Arc<dyn MarketEventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn MarketEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for CompositeEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketEventHandler for CompositeEventHandler {
    async fn on_market_change(&self, diff: MarketDiff) {
        for handler in &self.handlers {
            handler.on_market_change(diff.clone()).await;
        }
    }

    async fn on_submission(&self, event: SubmissionEvent) {
        for handler in &self.handlers {
            handler.on_submission(event.clone()).await;
        }
    }

    async fn on_error(&self, error: &MarketError) {
        for handler in &self.handlers {
            handler.on_error(error).await;
        }
    }
}
