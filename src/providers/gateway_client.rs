use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MarketError;
use crate::models::property::{AssetHolding, Property};
use crate::models::submission::{GroupOutcome, ListingRequest, PurchaseGroup};
use crate::traits::contract_client::ContractClient;
use crate::traits::wallet_provider::TransactionSigner;
use crate::utils::hex::encode_hex;

/// Endpoint configuration for the application gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_token: Option<String>,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), api_token: None }
    }

    /// Read `GATEWAY_URL` and optional `GATEWAY_TOKEN` from the environment.
    pub fn from_env() -> Result<Self, MarketError> {
        let base_url = std::env::var("GATEWAY_URL")
            .map_err(|_| MarketError::not_ready("GATEWAY_URL is not set"))?;
        Ok(Self { base_url, api_token: std::env::var("GATEWAY_TOKEN").ok() })
    }
}

/// [`ContractClient`] over the marketplace application gateway.
///
/// The gateway exposes the deployed contract as plain JSON endpoints and
/// performs the actual transaction encoding and submission. This client is
/// the explicit constructor replacing the source's dynamic client factory:
/// it binds an endpoint config, an application id, a sender identity and a
/// signer into one capability object.
pub struct GatewayClient {
    http: Client,
    config: GatewayConfig,
    app_id: u64,
    custody_address: String,
    sender: String,
    signer: Arc<dyn TransactionSigner>,
}

#[derive(Deserialize)]
struct AppInfo {
    custody_address: String,
}

#[derive(Serialize)]
struct SignedSubmission<T: Serialize> {
    sender: String,
    signature_hex: String,
    #[serde(flatten)]
    body: T,
}

#[derive(Serialize)]
struct ListingBody {
    request: ListingRequest,
}

#[derive(Serialize)]
struct PurchaseBody {
    group: PurchaseGroup,
}

#[derive(Deserialize)]
struct CreatedListing {
    asset_id: u64,
}

#[derive(Deserialize)]
struct ListingEntry {
    asset_id: u64,
    property: Property,
}

#[derive(Deserialize)]
struct HoldingsResponse {
    assets: Vec<AssetHolding>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

impl GatewayClient {
    /// Connect to the gateway and bind the contract's custody address.
    pub async fn connect(
        config: GatewayConfig,
        app_id: u64,
        sender: String,
        signer: Arc<dyn TransactionSigner>,
    ) -> Result<Self, MarketError> {
        let http = Client::new();
        let url = format!("{}/v1/apps/{app_id}", config.base_url);
        let response = http.get(&url).send().await.map_err(|err| {
            MarketError::not_ready(format!("gateway unreachable at {}: {err}", config.base_url))
        })?;
        let info: AppInfo = Self::expect_success(response).await?.json().await?;
        debug!("bound to app {} with custody address {}", app_id, info.custody_address);
        Ok(Self { http, config, app_id, custody_address: info.custody_address, sender, signer })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    /// Sign the canonical JSON bytes of a submission body.
    async fn sign<T: Serialize>(&self, kind: &str, body: &T) -> Result<String, MarketError> {
        let payload = serde_json::to_vec(body)
            .map_err(|err| MarketError::transport(format!("could not encode {kind}: {err}")))?;
        let signature = self.signer.sign_group(kind, &payload).await?;
        Ok(encode_hex(&signature))
    }

    /// Surface the gateway's error message verbatim on non-success status.
    async fn expect_success(response: Response) -> Result<Response, MarketError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.detail)
            .unwrap_or(text);
        if detail.is_empty() {
            Err(MarketError::transport(format!("gateway answered {status}")))
        } else {
            Err(MarketError::transport(detail))
        }
    }
}

#[async_trait]
impl ContractClient for GatewayClient {
    fn app_id(&self) -> u64 {
        self.app_id
    }

    fn custody_address(&self) -> String {
        self.custody_address.clone()
    }

    async fn create_listing(&self, request: ListingRequest) -> Result<u64, MarketError> {
        let body = ListingBody { request };
        let signature_hex = self.sign("listing", &body).await?;
        let submission =
            SignedSubmission { sender: self.sender.clone(), signature_hex, body };

        let url = self.url(&format!("/v1/apps/{}/listings", self.app_id));
        let response = self.authorize(self.http.post(&url).json(&submission)).send().await?;
        let created: CreatedListing = Self::expect_success(response).await?.json().await?;
        Ok(created.asset_id)
    }

    async fn submit_purchase_group(
        &self,
        group: PurchaseGroup,
    ) -> Result<GroupOutcome, MarketError> {
        let body = PurchaseBody { group };
        let signature_hex = self.sign("purchase", &body).await?;
        let submission =
            SignedSubmission { sender: self.sender.clone(), signature_hex, body };

        let url = self.url(&format!("/v1/apps/{}/purchases", self.app_id));
        let response = self.authorize(self.http.post(&url).json(&submission)).send().await?;
        let outcome: GroupOutcome = Self::expect_success(response).await?.json().await?;
        Ok(outcome)
    }

    async fn listed_properties(&self) -> Result<Vec<(u64, Property)>, MarketError> {
        let url = self.url(&format!("/v1/apps/{}/listings", self.app_id));
        let response = self.authorize(self.http.get(&url)).send().await?;
        let entries: Vec<ListingEntry> = Self::expect_success(response).await?.json().await?;
        Ok(entries.into_iter().map(|entry| (entry.asset_id, entry.property)).collect())
    }

    async fn account_holdings(&self, address: &str) -> Result<Vec<AssetHolding>, MarketError> {
        let url = self.url(&format!("/v1/accounts/{address}/holdings"));
        let response = self.authorize(self.http.get(&url)).send().await?;
        let holdings: HoldingsResponse = Self::expect_success(response).await?.json().await?;
        Ok(holdings.assets)
    }
}
