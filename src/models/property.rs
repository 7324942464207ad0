use serde::{Deserialize, Serialize};

/// A property listed for fractional ownership.
///
/// This is a read-only projection of contract state: the contract allocates
/// the share asset, records the listing in its box storage, and mutates
/// `available_shares` as purchases are accepted. A local copy is always a
/// stale snapshot and must be refetched, never patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Physical address (or display name) of the property.
    pub address: String,
    /// Total number of shares minted for this property.
    pub total_shares: u64,
    /// Shares still held by the pool and available for purchase.
    pub available_shares: u64,
    /// Price per share in micro-currency units.
    pub price_per_share: u64,
    /// The contract-issued asset representing shares. Listing identity.
    pub asset_id: u64,
    /// Account that listed the property.
    pub owner_address: String,
}

impl Property {
    /// Total cost of `shares` at the listed price, in micro-units.
    /// `None` on overflow.
    pub fn cost_of(&self, shares: u64) -> Option<u64> {
        shares.checked_mul(self.price_per_share)
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_shares == 0
    }
}

/// Shares of a listed property held by the connected account.
///
/// Derived, never persisted: recomputed on every reconciliation pass.
/// `shares_owned` is always strictly positive; zero-balance holdings are
/// filtered out during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedHolding {
    pub asset_id: u64,
    pub shares_owned: u64,
    pub property: Property,
}

impl OwnedHolding {
    /// Value of the held shares at the listed price, in micro-units.
    pub fn value_micro(&self) -> u64 {
        self.shares_owned.saturating_mul(self.property.price_per_share)
    }
}

/// One entry of an account's asset holdings as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHolding {
    pub asset_id: u64,
    pub amount: u64,
}
