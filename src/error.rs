use thiserror::Error;

/// Error taxonomy for the marketplace client.
///
/// Every variant carries a human-readable message suitable for direct
/// display next to the action that failed. None of these are fatal: the
/// caller is expected to leave the submission resumable and let the user
/// retry explicitly. There are no automatic retries anywhere in the crate,
/// since re-submitting a purchase without user intent could double-pay.
#[derive(Debug, Error)]
pub enum MarketError {
    /// The wallet or contract client is not initialized yet.
    #[error("{0}")]
    NotReady(String),

    /// Malformed or out-of-range input, caught before any network call.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Network or signing failure reported by the external client.
    #[error("{0}")]
    Transport(String),

    /// The contract executed but declined the purchase. Distinct from a
    /// transport failure: the submission reached the chain and came back
    /// with a falsy return value.
    #[error("contract declined the purchase of asset {asset_id}")]
    PurchaseRejected { asset_id: u64 },

    /// The account holdings lookup failed, so ownership could not be
    /// determined. Not the same as owning nothing.
    #[error("could not determine holdings for {address}: {reason}")]
    HoldingsUnavailable { address: String, reason: String },
}

impl MarketError {
    pub fn not_ready(message: impl Into<String>) -> Self {
        MarketError::NotReady(message.into())
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        MarketError::Validation { field, reason: reason.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        MarketError::Transport(message.into())
    }

    /// True when the failure happened before anything was dispatched to the
    /// external client.
    pub fn is_local(&self) -> bool {
        matches!(self, MarketError::NotReady(_) | MarketError::Validation { .. })
    }
}

impl From<reqwest::Error> for MarketError {
    fn from(err: reqwest::Error) -> Self {
        MarketError::Transport(err.to_string())
    }
}
