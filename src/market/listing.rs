use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::error::MarketError;
use crate::models::submission::{ListingRequest, SubmissionState};
use crate::traits::contract_client::ContractClient;
use crate::traits::wallet_provider::WalletProvider;

/// Extra fee covering the contract's inner asset-creation transaction,
/// in micro-units.
pub const LISTING_EXTRA_FEE_MICRO: u64 = 1_000;

/// Validates and submits new property listings.
///
/// One submission may be in flight per orchestrator instance; the caller is
/// expected to disable its trigger while [`SubmissionState::Pending`]. There
/// is no internal lock and no retry: a failed submission stays failed until
/// the user resubmits.
pub struct ListingOrchestrator {
    client: Arc<dyn ContractClient>,
    wallet: Arc<dyn WalletProvider>,
    state: Mutex<SubmissionState>,
}

impl ListingOrchestrator {
    pub fn new(client: Arc<dyn ContractClient>, wallet: Arc<dyn WalletProvider>) -> Self {
        Self { client, wallet, state: Mutex::new(SubmissionState::Idle) }
    }

    /// Current submission state.
    pub async fn state(&self) -> SubmissionState {
        self.state.lock().await.clone()
    }

    /// List a property for fractional ownership.
    ///
    /// On success the contract has minted a fresh share asset and recorded
    /// the listing under its id; that asset id is returned. Preconditions
    /// fail before anything reaches the external client.
    pub async fn submit_listing(
        &self,
        address: &str,
        total_shares: u64,
        price_per_share: u64,
    ) -> Result<u64, MarketError> {
        *self.state.lock().await = SubmissionState::Pending;

        let result = self.dispatch(address, total_shares, price_per_share).await;
        let mut state = self.state.lock().await;
        match &result {
            Ok(asset_id) => {
                *state = SubmissionState::Success(format!(
                    "Property listed! Asset id {asset_id}"
                ));
            }
            Err(err) => *state = SubmissionState::Failed(err.to_string()),
        }
        result
    }

    async fn dispatch(
        &self,
        address: &str,
        total_shares: u64,
        price_per_share: u64,
    ) -> Result<u64, MarketError> {
        let sender = self.wallet.active_address().ok_or_else(|| {
            MarketError::not_ready("Please connect your wallet to list a property.")
        })?;

        let address = address.trim();
        if address.is_empty() {
            return Err(MarketError::validation("address", "must not be empty"));
        }
        if total_shares == 0 {
            return Err(MarketError::validation("total shares", "must be at least 1"));
        }
        if price_per_share == 0 {
            return Err(MarketError::validation("price per share", "must be at least 1"));
        }

        let request = ListingRequest {
            sender,
            address: address.to_string(),
            total_shares,
            price_per_share,
            extra_fee_micro: LISTING_EXTRA_FEE_MICRO,
        };
        let asset_id = self.client.create_listing(request).await?;
        info!("property \"{}\" listed as asset {}", address, asset_id);
        Ok(asset_id)
    }
}
