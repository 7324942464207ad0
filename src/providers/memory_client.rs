use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::MarketError;
use crate::models::property::{AssetHolding, Property};
use crate::models::submission::{GroupOutcome, ListingRequest, PurchaseGroup};
use crate::traits::contract_client::ContractClient;

/// In-memory stand-in for the deployed contract, used by tests and offline
/// development.
///
/// It mirrors the contract's observable behavior: listings live in an
/// ordered box map keyed by a freshly minted asset id, purchases are
/// validated with the same rules the contract asserts, and the whole group
/// commits atomically or not at all. It is not the contract: there is no
/// consensus, no real custody and no fee accounting.
pub struct MemoryContractClient {
    app_id: u64,
    custody_address: String,
    state: Mutex<LedgerState>,
    decline_next_purchase: AtomicBool,
    fail_next_submission: AtomicBool,
    listings_fetched: AtomicUsize,
    holdings_fetched: AtomicUsize,
    submissions: AtomicUsize,
}

#[derive(Clone, Default)]
struct LedgerState {
    next_asset_id: u64,
    tx_counter: u64,
    /// Box-map iteration order is insertion order.
    listings: Vec<(u64, Property)>,
    /// address -> asset id -> amount
    holdings: HashMap<String, HashMap<u64, u64>>,
    /// micro-currency balances
    balances: HashMap<String, u64>,
    opted_in: HashSet<(String, u64)>,
}

impl MemoryContractClient {
    pub fn new(app_id: u64) -> Self {
        Self {
            app_id,
            custody_address: format!("APP-{app_id}-CUSTODY"),
            state: Mutex::new(LedgerState { next_asset_id: 1000, ..Default::default() }),
            decline_next_purchase: AtomicBool::new(false),
            fail_next_submission: AtomicBool::new(false),
            listings_fetched: AtomicUsize::new(0),
            holdings_fetched: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
        }
    }

    /// Credit an account with spendable micro-currency.
    pub async fn fund(&self, address: &str, amount_micro: u64) {
        let mut state = self.state.lock().await;
        *state.balances.entry(address.to_string()).or_default() += amount_micro;
    }

    /// Make the next purchase call return a falsy value without touching
    /// state: transport succeeds, the contract declines.
    pub fn decline_next_purchase(&self) {
        self.decline_next_purchase.store(true, Ordering::SeqCst);
    }

    /// Make the next submission fail at the transport level.
    pub fn fail_next_submission(&self) {
        self.fail_next_submission.store(true, Ordering::SeqCst);
    }

    /// How many times each fetch surface was hit. Lets tests assert that
    /// state was refetched rather than patched.
    pub fn fetch_counts(&self) -> (usize, usize) {
        (self.listings_fetched.load(Ordering::SeqCst), self.holdings_fetched.load(Ordering::SeqCst))
    }

    /// How many submissions (listings or purchases) reached the client.
    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub async fn balance_of(&self, address: &str) -> u64 {
        self.state.lock().await.balances.get(address).copied().unwrap_or(0)
    }

    pub async fn holding_of(&self, address: &str, asset_id: u64) -> u64 {
        self.state
            .lock()
            .await
            .holdings
            .get(address)
            .and_then(|assets| assets.get(&asset_id))
            .copied()
            .unwrap_or(0)
    }

    pub async fn is_opted_in(&self, address: &str, asset_id: u64) -> bool {
        self.state.lock().await.opted_in.contains(&(address.to_string(), asset_id))
    }

    fn take(flag: &AtomicBool) -> bool {
        flag.swap(false, Ordering::SeqCst)
    }

    /// Apply the purchase group to `state`, or explain why the contract
    /// would reject it. Mutations only land if every step passes.
    fn apply_purchase(
        state: &mut LedgerState,
        custody: &str,
        group: &PurchaseGroup,
    ) -> Result<(), String> {
        let call = &group.call;
        let payment = &call.payment;

        let property = state
            .listings
            .iter()
            .find(|(id, _)| *id == call.property_id)
            .map(|(_, p)| p.clone())
            .ok_or("Property not listed")?;

        if call.shares > property.available_shares {
            return Err("Not enough shares available".to_string());
        }
        let expected = call
            .shares
            .checked_mul(property.price_per_share)
            .ok_or("Invalid payment amount")?;
        if payment.amount_micro != expected {
            return Err("Invalid payment amount".to_string());
        }
        if payment.receiver != custody {
            return Err("Invalid payment receiver".to_string());
        }
        if payment.sender != call.sender {
            return Err("Invalid payment sender".to_string());
        }

        // Opt-in step. Idempotent if already opted in.
        state.opted_in.insert((group.opt_in.sender.clone(), group.opt_in.asset_id));
        if !state.opted_in.contains(&(call.sender.clone(), call.property_id)) {
            return Err("Buyer is not opted in to the share asset".to_string());
        }

        // Payment step: buyer -> custody.
        let buyer_balance = state.balances.get(&payment.sender).copied().unwrap_or(0);
        let total_debit = payment.amount_micro + group.extra_fee_micro;
        if buyer_balance < total_debit {
            return Err("Overspend: insufficient balance for payment and fees".to_string());
        }
        *state.balances.entry(payment.sender.clone()).or_default() -= total_debit;
        *state.balances.entry(custody.to_string()).or_default() += payment.amount_micro;

        // Share transfer: pool -> buyer.
        let pool = state.holdings.entry(custody.to_string()).or_default();
        let pooled = pool.entry(call.property_id).or_default();
        *pooled -= call.shares;
        *state
            .holdings
            .entry(call.sender.clone())
            .or_default()
            .entry(call.property_id)
            .or_default() += call.shares;

        // Inner payment: custody -> property owner.
        *state.balances.entry(custody.to_string()).or_default() -= payment.amount_micro;
        *state.balances.entry(property.owner_address.clone()).or_default() +=
            payment.amount_micro;

        // Decrement the listing's available shares in the box map.
        for (id, listed) in &mut state.listings {
            if *id == call.property_id {
                listed.available_shares -= call.shares;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ContractClient for MemoryContractClient {
    fn app_id(&self) -> u64 {
        self.app_id
    }

    fn custody_address(&self) -> String {
        self.custody_address.clone()
    }

    async fn create_listing(&self, request: ListingRequest) -> Result<u64, MarketError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        if Self::take(&self.fail_next_submission) {
            return Err(MarketError::transport("simulated network failure"));
        }

        let mut state = self.state.lock().await;
        state.next_asset_id += 1;
        let asset_id = state.next_asset_id;

        let property = Property {
            address: request.address,
            total_shares: request.total_shares,
            available_shares: request.total_shares,
            price_per_share: request.price_per_share,
            asset_id,
            owner_address: request.sender,
        };
        // The minted share pool sits with the contract until purchased.
        state
            .holdings
            .entry(self.custody_address.clone())
            .or_default()
            .insert(asset_id, request.total_shares);
        state.listings.push((asset_id, property));
        debug!("listed asset {} ({} shares)", asset_id, request.total_shares);
        Ok(asset_id)
    }

    async fn submit_purchase_group(
        &self,
        group: PurchaseGroup,
    ) -> Result<GroupOutcome, MarketError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        if Self::take(&self.fail_next_submission) {
            return Err(MarketError::transport("simulated network failure"));
        }

        let mut state = self.state.lock().await;
        state.tx_counter += 1;
        let tx_id = format!("SIM{:06}", state.tx_counter);

        if Self::take(&self.decline_next_purchase) {
            // Contract executed and declined: falsy return, no state change.
            return Ok(GroupOutcome { tx_id, returns: vec![json!(false)] });
        }

        // All-or-nothing: validate and mutate a copy, swap it in on success.
        let mut staged = state.clone();
        match Self::apply_purchase(&mut staged, &self.custody_address, &group) {
            Ok(()) => {
                *state = staged;
                Ok(GroupOutcome { tx_id, returns: vec![json!(true)] })
            }
            Err(reason) => Err(MarketError::transport(format!(
                "transaction group rejected: {reason}"
            ))),
        }
    }

    async fn listed_properties(&self) -> Result<Vec<(u64, Property)>, MarketError> {
        self.listings_fetched.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().await.listings.clone())
    }

    async fn account_holdings(&self, address: &str) -> Result<Vec<AssetHolding>, MarketError> {
        self.holdings_fetched.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;
        let mut assets: Vec<AssetHolding> = state
            .holdings
            .get(address)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(asset_id, amount)| AssetHolding { asset_id: *asset_id, amount: *amount })
                    .collect()
            })
            .unwrap_or_default();
        assets.sort_by_key(|holding| holding.asset_id);
        Ok(assets)
    }
}
