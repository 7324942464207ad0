use std::sync::Arc;

use async_trait::async_trait;

use crate::error::MarketError;

/// Signs transaction groups on behalf of the active account.
///
/// Wallet-connect protocols are not reimplemented here; a signer is an
/// opaque capability handed to the contract client at construction time.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Sign the canonical bytes of a transaction group.
    async fn sign_group(&self, group_id: &str, payload: &[u8]) -> Result<Vec<u8>, MarketError>;
}

/// A user's wallet session.
///
/// Polymorphic over wallet kinds: each implementation knows how to produce
/// the active address and a signer for it. Orchestrators receive this as an
/// explicitly passed context object, never as ambient global state.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Establish the wallet session.
    async fn connect(&self) -> Result<(), MarketError>;

    /// Tear the session down. Infallible; a disconnected wallet simply has
    /// no active address.
    async fn disconnect(&self);

    /// The connected account, if any.
    fn active_address(&self) -> Option<String>;

    /// A signer bound to the active account, if connected.
    fn signer(&self) -> Option<Arc<dyn TransactionSigner>>;
}
