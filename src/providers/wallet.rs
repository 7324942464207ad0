use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::MarketError;
use crate::traits::wallet_provider::{TransactionSigner, WalletProvider};
use crate::utils::hex::{decode_hex, encode_hex};

/// Wallet backed by a key-management daemon.
///
/// The account's keys never enter this process: signing requests are
/// forwarded to the daemon over HTTP and only the detached signature comes
/// back. This is the deployment shape used with local development networks,
/// where a key daemon holds the dev accounts.
pub struct DaemonWallet {
    address: String,
    signer: Arc<DaemonSigner>,
    http: Client,
    base_url: String,
    connected: AtomicBool,
}

impl DaemonWallet {
    pub fn new(base_url: String, address: String, token: Option<String>) -> Self {
        let http = Client::new();
        let signer = Arc::new(DaemonSigner {
            http: http.clone(),
            base_url: base_url.clone(),
            address: address.clone(),
            token,
        });
        Self { address, signer, http, base_url, connected: AtomicBool::new(false) }
    }

    /// Read `SIGNER_URL`, `WALLET_ADDRESS` and optional `SIGNER_TOKEN` from
    /// the environment.
    pub fn from_env() -> Result<Self, MarketError> {
        let base_url = std::env::var("SIGNER_URL")
            .map_err(|_| MarketError::not_ready("SIGNER_URL is not set"))?;
        let address = std::env::var("WALLET_ADDRESS")
            .map_err(|_| MarketError::not_ready("WALLET_ADDRESS is not set"))?;
        let token = std::env::var("SIGNER_TOKEN").ok();
        Ok(Self::new(base_url, address, token))
    }
}

#[async_trait]
impl WalletProvider for DaemonWallet {
    async fn connect(&self) -> Result<(), MarketError> {
        let url = format!("{}/health", self.base_url);
        let response = self.http.get(&url).send().await.map_err(|err| {
            MarketError::not_ready(format!("key daemon unreachable at {}: {err}", self.base_url))
        })?;
        if !response.status().is_success() {
            return Err(MarketError::not_ready(format!(
                "key daemon at {} answered {}",
                self.base_url,
                response.status()
            )));
        }
        self.connected.store(true, Ordering::SeqCst);
        debug!("wallet session established for {}", self.address);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn active_address(&self) -> Option<String> {
        if self.connected.load(Ordering::SeqCst) {
            Some(self.address.clone())
        } else {
            None
        }
    }

    fn signer(&self) -> Option<Arc<dyn TransactionSigner>> {
        if self.connected.load(Ordering::SeqCst) {
            Some(self.signer.clone() as Arc<dyn TransactionSigner>)
        } else {
            None
        }
    }
}

/// Signer half of [`DaemonWallet`].
pub struct DaemonSigner {
    http: Client,
    base_url: String,
    address: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct SignResponse {
    signature_hex: String,
}

#[async_trait]
impl TransactionSigner for DaemonSigner {
    async fn sign_group(&self, group_id: &str, payload: &[u8]) -> Result<Vec<u8>, MarketError> {
        let url = format!("{}/v1/sign", self.base_url);
        let body = json!({
            "address": self.address,
            "group_id": group_id,
            "payload_hex": encode_hex(payload),
        });

        let mut request = self.http.post(&url).json(&body);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            warn!("signing request for group {} failed: {}", group_id, status);
            return Err(MarketError::transport(format!(
                "key daemon refused to sign group {group_id}: {status} {detail}"
            )));
        }

        let signed: SignResponse = response.json().await?;
        decode_hex(&signed.signature_hex)
            .map_err(|err| MarketError::transport(format!("malformed signature from daemon: {err}")))
    }
}

/// In-memory wallet for tests and offline development. Signs with a
/// deterministic placeholder signature.
pub struct MemoryWallet {
    address: String,
    connected: AtomicBool,
}

impl MemoryWallet {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), connected: AtomicBool::new(false) }
    }

    /// A wallet that is already connected.
    pub fn connected(address: impl Into<String>) -> Self {
        let wallet = Self::new(address);
        wallet.connected.store(true, Ordering::SeqCst);
        wallet
    }
}

#[async_trait]
impl WalletProvider for MemoryWallet {
    async fn connect(&self) -> Result<(), MarketError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn active_address(&self) -> Option<String> {
        if self.connected.load(Ordering::SeqCst) {
            Some(self.address.clone())
        } else {
            None
        }
    }

    fn signer(&self) -> Option<Arc<dyn TransactionSigner>> {
        if self.connected.load(Ordering::SeqCst) {
            Some(Arc::new(MemorySigner { address: self.address.clone() }))
        } else {
            None
        }
    }
}

struct MemorySigner {
    address: String,
}

#[async_trait]
impl TransactionSigner for MemorySigner {
    async fn sign_group(&self, group_id: &str, payload: &[u8]) -> Result<Vec<u8>, MarketError> {
        let mut signature = format!("sig:{}:{}:", self.address, group_id).into_bytes();
        signature.extend_from_slice(&(payload.len() as u64).to_be_bytes());
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_wallet_exposes_address_only_when_connected() {
        let wallet = MemoryWallet::new("BUYER");
        assert!(wallet.active_address().is_none());
        assert!(wallet.signer().is_none());

        wallet.connect().await.unwrap();
        assert_eq!(wallet.active_address().as_deref(), Some("BUYER"));
        assert!(wallet.signer().is_some());

        wallet.disconnect().await;
        assert!(wallet.active_address().is_none());
    }

    #[tokio::test]
    async fn memory_signer_is_deterministic() {
        let wallet = MemoryWallet::connected("BUYER");
        let signer = wallet.signer().unwrap();
        let first = signer.sign_group("G1", b"payload").await.unwrap();
        let second = signer.sign_group("G1", b"payload").await.unwrap();
        assert_eq!(first, second);
    }
}
