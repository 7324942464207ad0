use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transient outcome of one orchestrator instance.
///
/// Reset to `Pending` at the start of every submission; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Pending,
    Success(String),
    Failed(String),
}

impl SubmissionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SubmissionState::Pending)
    }

    /// The user-facing message of a finished submission, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            SubmissionState::Success(msg) | SubmissionState::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// A completed submission, reported through the event handlers.
#[derive(Debug, Clone)]
pub enum SubmissionEvent {
    ListingCreated { asset_id: u64, address: String },
    SharesPurchased { asset_id: u64, shares: u64, tx_id: String },
}

/// One new-listing submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRequest {
    pub sender: String,
    pub address: String,
    pub total_shares: u64,
    pub price_per_share: u64,
    /// Extra fee covering the contract's inner asset-creation transaction.
    pub extra_fee_micro: u64,
}

/// Asset opt-in for the buyer. Required before the account can hold the
/// share asset; idempotent at the contract level but always issued here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetOptIn {
    pub sender: String,
    pub asset_id: u64,
}

/// Payment carried inside the purchase call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentParams {
    pub sender: String,
    pub receiver: String,
    pub amount_micro: u64,
}

/// Reference to a contract storage box touched by a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxRef {
    pub name: Vec<u8>,
}

/// The pay-and-purchase application call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseCall {
    pub sender: String,
    pub property_id: u64,
    pub shares: u64,
    /// Grouped payment to the contract's custody address.
    pub payment: PaymentParams,
    pub account_refs: Vec<String>,
    pub asset_refs: Vec<u64>,
}

/// The atomic purchase group: buyer opt-in plus the pay-and-purchase call.
///
/// Submitted as a single unit so that payment and share transfer are
/// all-or-nothing. If the contract rejects the purchase, the opt-in and the
/// payment must not commit either.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseGroup {
    pub opt_in: AssetOptIn,
    pub call: PurchaseCall,
    pub box_refs: Vec<BoxRef>,
    pub extra_fee_micro: u64,
}

impl PurchaseGroup {
    pub fn payment(&self) -> &PaymentParams {
        &self.call.payment
    }
}

/// Transport-level result of a submitted group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub tx_id: String,
    /// ABI return values of the application calls in the group, in order.
    #[serde(default)]
    pub returns: Vec<Value>,
}

impl GroupOutcome {
    /// Business-logic verdict of the purchase call.
    ///
    /// The contract's return value is inspected: an absent, null, false,
    /// zero, or empty-string return means the contract executed but
    /// declined the purchase, even though the submission itself succeeded.
    pub fn confirmed(&self) -> bool {
        match self.returns.first() {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(true),
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}
