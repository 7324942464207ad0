use async_trait::async_trait;

use crate::error::MarketError;
use crate::models::property::{AssetHolding, Property};
use crate::models::submission::{GroupOutcome, ListingRequest, PurchaseGroup};

/// Capability surface of the deployed marketplace contract.
///
/// The contract itself (box storage, asset custody, group atomicity) runs on
/// the external platform; implementations of this trait only carry requests
/// there and bring results back. Everything that can suspend does so at
/// these boundary calls.
#[async_trait]
pub trait ContractClient: Send + Sync {
    /// Application id of the deployed contract.
    fn app_id(&self) -> u64;

    /// The contract's custody account. Share payments are sent here.
    fn custody_address(&self) -> String;

    /// Submit a new property listing. The contract mints a fresh share
    /// asset and records the listing under the asset id.
    async fn create_listing(&self, request: ListingRequest) -> Result<u64, MarketError>;

    /// Submit the atomic opt-in + pay-and-purchase group as one unit.
    ///
    /// A returned `Ok` only means the submission was accepted at the
    /// transport level; callers must still inspect the group's return
    /// values for the contract's verdict.
    async fn submit_purchase_group(&self, group: PurchaseGroup)
        -> Result<GroupOutcome, MarketError>;

    /// Fetch every listed property, in the contract's box-map iteration
    /// order.
    async fn listed_properties(&self) -> Result<Vec<(u64, Property)>, MarketError>;

    /// Fetch the asset holdings of an account.
    async fn account_holdings(&self, address: &str) -> Result<Vec<AssetHolding>, MarketError>;
}
