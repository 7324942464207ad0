use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::MarketError;
use crate::models::submission::{
    AssetOptIn, BoxRef, GroupOutcome, PaymentParams, PurchaseCall, PurchaseGroup, SubmissionState,
};
use crate::traits::contract_client::ContractClient;
use crate::traits::wallet_provider::WalletProvider;

/// Extra fee covering the contract's inner transactions (share transfer
/// plus owner payout), in micro-units.
pub const PURCHASE_EXTRA_FEE_MICRO: u64 = 2_000;

/// Key prefix of the contract's listed-properties box map.
pub const LISTINGS_BOX_PREFIX: &str = "properties";

/// Box name for a listing: the map prefix followed by the big-endian
/// encoding of the asset id, matching how the contract addresses its boxes.
pub fn box_key(prefix: &str, asset_id: u64) -> Vec<u8> {
    let mut name = Vec::with_capacity(prefix.len() + 8);
    name.extend_from_slice(prefix.as_bytes());
    name.extend_from_slice(&asset_id.to_be_bytes());
    name
}

/// Parse a user-entered share count into a positive integer.
pub fn parse_share_count(input: &str) -> Result<u64, MarketError> {
    let trimmed = input.trim();
    let shares: u64 = trimmed.parse().map_err(|_| {
        MarketError::validation("share count", format!("`{trimmed}` is not a whole number"))
    })?;
    if shares == 0 {
        return Err(MarketError::validation("share count", "must be at least 1"));
    }
    Ok(shares)
}

/// Full caller-side validation of a share count against the last fetched
/// snapshot of a listing's availability.
pub fn validate_share_count(input: &str, available_shares: u64) -> Result<u64, MarketError> {
    let shares = parse_share_count(input)?;
    if shares > available_shares {
        return Err(MarketError::validation(
            "share count",
            format!("only {available_shares} share(s) available"),
        ));
    }
    Ok(shares)
}

/// Validates and submits share purchases as one atomic group.
///
/// The group bundles the buyer's asset opt-in with the pay-and-purchase
/// call so that payment and share transfer are all-or-nothing: the user
/// pays only if shares are actually received. Pending submissions are
/// tracked per property id so a view can disable just the affected row.
pub struct PurchaseOrchestrator {
    client: Arc<dyn ContractClient>,
    wallet: Arc<dyn WalletProvider>,
    state: Mutex<SubmissionState>,
    pending: DashMap<u64, ()>,
}

impl PurchaseOrchestrator {
    pub fn new(client: Arc<dyn ContractClient>, wallet: Arc<dyn WalletProvider>) -> Self {
        Self { client, wallet, state: Mutex::new(SubmissionState::Idle), pending: DashMap::new() }
    }

    /// Current submission state.
    pub async fn state(&self) -> SubmissionState {
        self.state.lock().await.clone()
    }

    /// Whether a purchase of this property is currently in flight.
    pub fn is_pending(&self, property_id: u64) -> bool {
        self.pending.contains_key(&property_id)
    }

    /// Buy shares of a listed property.
    ///
    /// `share_count` arrives as the raw user input and must parse to a
    /// positive integer before anything is dispatched; the bound against
    /// `available_shares` is the caller's job via [`validate_share_count`],
    /// since this orchestrator trusts the last fetched snapshot. A
    /// transport-level success whose return value is falsy is reported as
    /// [`MarketError::PurchaseRejected`]: the contract executed but
    /// declined the purchase. Never retried automatically; a resubmission
    /// without user intent could double-pay.
    pub async fn submit_purchase(
        &self,
        property_id: u64,
        price_per_share: u64,
        owner_address: &str,
        share_count: &str,
    ) -> Result<GroupOutcome, MarketError> {
        *self.state.lock().await = SubmissionState::Pending;

        let prepared = self.prepare(property_id, price_per_share, owner_address, share_count);
        let result = match prepared {
            Ok((group, shares)) => {
                self.pending.insert(property_id, ());
                let result = self.dispatch(property_id, group, shares).await;
                self.pending.remove(&property_id);
                result
            }
            Err(err) => Err(err),
        };

        let mut state = self.state.lock().await;
        match &result {
            Ok(_) => *state = SubmissionState::Success("Shares purchased!".to_string()),
            Err(err) => *state = SubmissionState::Failed(err.to_string()),
        }
        result
    }

    /// Everything that must pass before the client is contacted.
    fn prepare(
        &self,
        property_id: u64,
        price_per_share: u64,
        owner_address: &str,
        share_count: &str,
    ) -> Result<(PurchaseGroup, u64), MarketError> {
        let buyer = self
            .wallet
            .active_address()
            .ok_or_else(|| MarketError::not_ready("Please connect your wallet to buy shares."))?;

        let shares = parse_share_count(share_count)?;
        let payment_micro = shares.checked_mul(price_per_share).ok_or_else(|| {
            MarketError::validation("share count", "total price overflows the currency range")
        })?;

        let group = PurchaseGroup {
            opt_in: AssetOptIn { sender: buyer.clone(), asset_id: property_id },
            call: PurchaseCall {
                sender: buyer.clone(),
                property_id,
                shares,
                payment: PaymentParams {
                    sender: buyer.clone(),
                    receiver: self.client.custody_address(),
                    amount_micro: payment_micro,
                },
                account_refs: vec![buyer, owner_address.to_string()],
                asset_refs: vec![property_id],
            },
            box_refs: vec![BoxRef { name: box_key(LISTINGS_BOX_PREFIX, property_id) }],
            extra_fee_micro: PURCHASE_EXTRA_FEE_MICRO,
        };
        Ok((group, shares))
    }

    async fn dispatch(
        &self,
        property_id: u64,
        group: PurchaseGroup,
        shares: u64,
    ) -> Result<GroupOutcome, MarketError> {
        let outcome = self.client.submit_purchase_group(group).await?;
        if !outcome.confirmed() {
            return Err(MarketError::PurchaseRejected { asset_id: property_id });
        }
        info!("purchased {} share(s) of asset {} in {}", shares, property_id, outcome.tx_id);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submission::ListingRequest;
    use crate::providers::memory_client::MemoryContractClient;
    use crate::providers::wallet::MemoryWallet;

    #[test]
    fn box_key_is_prefix_plus_big_endian_id() {
        let key = box_key("properties", 0x0102);
        let mut expected = b"properties".to_vec();
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0x01, 0x02]);
        assert_eq!(key, expected);
    }

    #[test]
    fn share_count_validation_accepts_the_full_range() {
        for input in ["1", "3", " 5 "] {
            assert!(validate_share_count(input, 5).is_ok(), "{input} should be accepted");
        }
    }

    #[test]
    fn share_count_validation_rejects_out_of_range_and_garbage() {
        assert!(matches!(validate_share_count("0", 5), Err(MarketError::Validation { .. })));
        assert!(matches!(validate_share_count("6", 5), Err(MarketError::Validation { .. })));
        assert!(matches!(validate_share_count("-1", 5), Err(MarketError::Validation { .. })));
        assert!(matches!(validate_share_count("2.5", 5), Err(MarketError::Validation { .. })));
        assert!(matches!(validate_share_count("many", 5), Err(MarketError::Validation { .. })));
    }

    async fn seeded(
        connected: bool,
    ) -> (Arc<MemoryContractClient>, PurchaseOrchestrator, u64) {
        let client = Arc::new(MemoryContractClient::new(7));
        let asset_id = client
            .create_listing(ListingRequest {
                sender: "OWNER".to_string(),
                address: "9 Dock Road".to_string(),
                total_shares: 10,
                price_per_share: 100,
                extra_fee_micro: 0,
            })
            .await
            .unwrap();
        let submissions_before = client.submission_count();
        client.fund("BUYER", 1_000_000).await;

        let wallet: Arc<MemoryWallet> = if connected {
            Arc::new(MemoryWallet::connected("BUYER"))
        } else {
            Arc::new(MemoryWallet::new("BUYER"))
        };
        let orchestrator = PurchaseOrchestrator::new(client.clone(), wallet);
        assert_eq!(submissions_before, 1);
        (client, orchestrator, asset_id)
    }

    #[tokio::test]
    async fn zero_share_count_fails_validation_without_any_call() {
        let (client, orchestrator, asset_id) = seeded(true).await;
        let err =
            orchestrator.submit_purchase(asset_id, 100, "OWNER", "0").await.unwrap_err();
        assert!(matches!(err, MarketError::Validation { .. }));
        // Only the seeding listing reached the client.
        assert_eq!(client.submission_count(), 1);
    }

    #[tokio::test]
    async fn purchase_without_wallet_is_not_ready() {
        let (client, orchestrator, asset_id) = seeded(false).await;
        let err =
            orchestrator.submit_purchase(asset_id, 100, "OWNER", "2").await.unwrap_err();
        assert!(matches!(err, MarketError::NotReady(_)));
        assert_eq!(client.submission_count(), 1);
    }

    #[tokio::test]
    async fn successful_purchase_confirms_and_clears_pending() {
        let (client, orchestrator, asset_id) = seeded(true).await;
        let outcome =
            orchestrator.submit_purchase(asset_id, 100, "OWNER", "3").await.unwrap();
        assert!(outcome.confirmed());
        assert!(!orchestrator.is_pending(asset_id));
        assert_eq!(client.holding_of("BUYER", asset_id).await, 3);
        assert!(matches!(orchestrator.state().await, SubmissionState::Success(_)));
    }

    #[tokio::test]
    async fn falsy_return_is_a_rejection_not_a_success() {
        let (client, orchestrator, asset_id) = seeded(true).await;
        client.decline_next_purchase();
        let err =
            orchestrator.submit_purchase(asset_id, 100, "OWNER", "3").await.unwrap_err();
        assert!(matches!(err, MarketError::PurchaseRejected { asset_id: id } if id == asset_id));
        // Transport succeeded, but no partial effects may be visible.
        assert_eq!(client.holding_of("BUYER", asset_id).await, 0);
        assert!(!client.is_opted_in("BUYER", asset_id).await);
    }

    #[tokio::test]
    async fn group_carries_box_account_and_asset_references() {
        let (client, orchestrator, asset_id) = seeded(true).await;
        let (group, shares) =
            orchestrator.prepare(asset_id, 100, "OWNER", "4").unwrap();
        assert_eq!(shares, 4);
        assert_eq!(group.payment().amount_micro, 400);
        assert_eq!(group.payment().receiver, client.custody_address());
        assert_eq!(group.opt_in.asset_id, asset_id);
        assert_eq!(group.box_refs, vec![BoxRef { name: box_key(LISTINGS_BOX_PREFIX, asset_id) }]);
        assert_eq!(group.call.account_refs, vec!["BUYER".to_string(), "OWNER".to_string()]);
        assert_eq!(group.call.asset_refs, vec![asset_id]);
        assert_eq!(group.extra_fee_micro, PURCHASE_EXTRA_FEE_MICRO);
    }
}
