use chrono::{DateTime, Utc};

use super::property::Property;

/// Snapshot of the global listing set at a specific time.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Listings in the contract's box-map iteration order, keyed by asset id.
    pub listings: Vec<(u64, Property)>,
}

impl MarketSnapshot {
    pub fn new(listings: Vec<(u64, Property)>) -> Self {
        Self { timestamp: Utc::now(), listings }
    }

    /// Look up a listing by its asset id.
    pub fn get(&self, asset_id: u64) -> Option<&Property> {
        self.listings.iter().find(|(id, _)| *id == asset_id).map(|(_, p)| p)
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn listing_count(&self) -> usize {
        self.listings.len()
    }

    /// Sum of `available_shares * price_per_share` across all listings,
    /// in micro-units. Saturates instead of overflowing.
    pub fn open_market_value_micro(&self) -> u64 {
        self.listings
            .iter()
            .map(|(_, p)| p.available_shares.saturating_mul(p.price_per_share))
            .fold(0u64, u64::saturating_add)
    }
}

/// Difference between two market snapshots.
///
/// `available_shares` moves whenever the contract accepts a purchase, so a
/// non-empty diff between polls usually means other buyers got there first.
#[derive(Debug, Default, Clone)]
pub struct MarketDiff {
    /// Properties present in the new snapshot only.
    pub listed: Vec<Property>,
    /// Properties present in the old snapshot only.
    pub delisted: Vec<Property>,
    /// Listings whose available share count moved.
    pub changes: Vec<ListingChange>,
}

impl MarketDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.listed.is_empty() && self.delisted.is_empty() && self.changes.is_empty()
    }
}

/// Movement in a single listing's available share count.
#[derive(Debug, Clone)]
pub struct ListingChange {
    pub asset_id: u64,
    pub address: String,
    pub old_available: u64,
    pub new_available: u64,
}

impl ListingChange {
    /// Shares that left (negative) or returned to (positive) the pool.
    pub fn shares_moved(&self) -> i64 {
        self.new_available as i64 - self.old_available as i64
    }
}
