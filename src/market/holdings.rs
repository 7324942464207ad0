use std::collections::HashMap;
use std::sync::Arc;

use crate::error::MarketError;
use crate::models::property::{AssetHolding, OwnedHolding, Property};
use crate::traits::contract_client::ContractClient;
use crate::traits::wallet_provider::WalletProvider;

/// Cross-reference the global listing set against an account's asset
/// holdings to derive the properties the account owns shares in.
///
/// Pure and deterministic: holdings are indexed by asset id first, then the
/// listings are walked in their given order, so the output order follows
/// `properties`. A listing appears in the result only when the account
/// holds a strictly positive amount of its share asset; holdings that do
/// not correspond to any listing are ignored.
pub fn reconcile(
    properties: &[(u64, Property)],
    holdings: &[AssetHolding],
) -> Vec<OwnedHolding> {
    let amounts: HashMap<u64, u64> =
        holdings.iter().map(|holding| (holding.asset_id, holding.amount)).collect();

    properties
        .iter()
        .filter_map(|(asset_id, property)| match amounts.get(asset_id) {
            Some(&amount) if amount > 0 => Some(OwnedHolding {
                asset_id: *asset_id,
                shares_owned: amount,
                property: property.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// Fetches both sides of the reconciliation from the external source of
/// truth and distinguishes "owns nothing" from "could not determine
/// ownership".
pub struct HoldingsReconciler {
    client: Arc<dyn ContractClient>,
    wallet: Arc<dyn WalletProvider>,
}

impl HoldingsReconciler {
    pub fn new(client: Arc<dyn ContractClient>, wallet: Arc<dyn WalletProvider>) -> Self {
        Self { client, wallet }
    }

    /// Recompute the connected account's owned properties.
    ///
    /// A failing account lookup yields [`MarketError::HoldingsUnavailable`]
    /// rather than an empty list; an empty `Ok` really means the account
    /// owns no shares of any listed property.
    pub async fn owned_properties(&self) -> Result<Vec<OwnedHolding>, MarketError> {
        let address = self.wallet.active_address().ok_or_else(|| {
            MarketError::not_ready("Please connect your wallet to view your owned properties.")
        })?;

        let properties = self.client.listed_properties().await?;
        let holdings =
            self.client.account_holdings(&address).await.map_err(|err| {
                MarketError::HoldingsUnavailable { address, reason: err.to_string() }
            })?;

        Ok(reconcile(&properties, &holdings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(asset_id: u64, available: u64) -> Property {
        Property {
            address: format!("unit {asset_id}"),
            total_shares: 10,
            available_shares: available,
            price_per_share: 1_000,
            asset_id,
            owner_address: "OWNER".to_string(),
        }
    }

    fn holding(asset_id: u64, amount: u64) -> AssetHolding {
        AssetHolding { asset_id, amount }
    }

    #[test]
    fn intersects_listings_with_positive_holdings() {
        let properties = vec![(1, property(1, 5)), (2, property(2, 0))];
        let holdings = vec![holding(1, 3), holding(2, 0), holding(3, 10)];

        let owned = reconcile(&properties, &holdings);
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].asset_id, 1);
        assert_eq!(owned[0].shares_owned, 3);
        assert_eq!(owned[0].property, properties[0].1);
    }

    #[test]
    fn no_holdings_means_no_owned_properties() {
        let properties = vec![(1, property(1, 5)), (2, property(2, 2))];
        assert!(reconcile(&properties, &[]).is_empty());
    }

    #[test]
    fn output_follows_listing_order_and_is_idempotent() {
        let properties =
            vec![(9, property(9, 1)), (4, property(4, 1)), (7, property(7, 1))];
        let holdings = vec![holding(7, 2), holding(9, 5)];

        let first = reconcile(&properties, &holdings);
        let ids: Vec<u64> = first.iter().map(|o| o.asset_id).collect();
        assert_eq!(ids, vec![9, 7]);

        let second = reconcile(&properties, &holdings);
        assert_eq!(first, second);
    }

    #[test]
    fn zero_amount_holdings_never_appear() {
        let properties = vec![(1, property(1, 5))];
        let holdings = vec![holding(1, 0)];
        assert!(reconcile(&properties, &holdings).is_empty());
    }
}
