//! HTTP boundary of the donation-contract variant.
//!
//! The donation frontends do not talk to the chain directly; a backend
//! service deploys the contract and answers over plain JSON. This client
//! wraps that boundary.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

#[derive(Debug, Clone, Serialize)]
pub struct ContractCreateRequest {
    pub contract_id: String,
    pub expiry: u64,
    pub question: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractCreateResponse {
    pub status: String,
    pub contract_id: Option<String>,
    pub algorand_app_id: Option<u64>,
    pub detail: Option<String>,
}

/// Client for the donation backend.
pub struct DonationApi {
    http: Client,
    base_url: String,
}

impl DonationApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: Client::new(), base_url: base_url.into() }
    }

    /// Read `DONATION_API_URL` from the environment, defaulting to the
    /// local development backend.
    pub fn from_env() -> Self {
        let base_url = std::env::var("DONATION_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        Self::new(base_url)
    }

    /// Create a donation contract.
    ///
    /// A non-success envelope surfaces the backend's `detail` message
    /// verbatim; the caller decides whether and when to resubmit.
    pub async fn create_contract(
        &self,
        contract_id: impl Into<String>,
        expiry: u64,
        question: impl Into<String>,
    ) -> Result<ContractCreateResponse, MarketError> {
        let request = ContractCreateRequest {
            contract_id: contract_id.into(),
            expiry,
            question: question.into(),
        };

        let url = format!("{}/contract/create", self.base_url);
        let response = self.http.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(MarketError::transport(if detail.is_empty() {
                format!("donation backend answered {status}")
            } else {
                detail
            }));
        }

        let envelope: ContractCreateResponse = response.json().await?;
        if envelope.status != "success" {
            let message = envelope
                .detail
                .clone()
                .unwrap_or_else(|| format!("contract creation ended with status `{}`", envelope.status));
            return Err(MarketError::transport(message));
        }
        Ok(envelope)
    }
}
