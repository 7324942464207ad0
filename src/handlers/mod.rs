//! Event handlers for market and holding changes

pub mod composite;
pub mod console;
pub mod webhook;

// Re-export for convenience
pub use composite::CompositeEventHandler;
pub use console::{ConsoleEventHandler, ConsoleHoldingHandler};
pub use webhook::{WebhookEventHandler, WebhookNotifier};
