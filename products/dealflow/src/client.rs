//! `reqwest` implementation of [`DealGateway`] against the deal REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    api::{
        CloseDealRequest, CloseDealResponse, CreateDealRequest, LoseDealRequest, SearchResponse,
        UpdateStageRequest,
    },
    deal::{Deal, DealId},
    error::GatewayError,
    gateway::DealGateway,
    stage::{DealStage, LossReason},
};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
/// Where the UI goes when the API answers 401.
pub const LOGIN_PATH: &str = "/login";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            timeout: None,
        }
    }

    /// `DEALFLOW_API_URL`, falling back to the local development server.
    pub fn from_env() -> Self {
        let base_url = std::env::var("DEALFLOW_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Session cookies are kept in the client's cookie store and sent with every call.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    http: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: ClientConfig) -> Result<Self, GatewayError> {
        let mut builder = Client::builder().cookie_store(true);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|source| GatewayError::Transport {
            operation: "build http client",
            source,
        })?;
        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|source| GatewayError::Transport { operation, source })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| GatewayError::Transport { operation, source })?;
        debug!(operation, status = status.as_u16(), "deal api responded");

        if status == StatusCode::UNAUTHORIZED {
            warn!(operation, "session rejected; login required");
            return Err(GatewayError::Unauthorized {
                redirect_to: LOGIN_PATH,
            });
        }
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string()
                });
            return Err(GatewayError::status(operation, status.as_u16(), message));
        }
        Ok(body.to_vec())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let body = self.execute(operation, request).await?;
        serde_json::from_slice(&body).map_err(|err| GatewayError::Decode {
            operation,
            message: err.to_string(),
        })
    }
}

#[async_trait]
impl DealGateway for HttpGateway {
    async fn list_deals(&self, archived: bool) -> Result<Vec<Deal>, GatewayError> {
        let request = self
            .http
            .get(self.url("/api/deals"))
            .query(&[("archived", archived)]);
        self.fetch("fetch deals", request).await
    }

    async fn create_deal(&self, request: &CreateDealRequest) -> Result<Deal, GatewayError> {
        let request = self.http.post(self.url("/api/deals")).json(request);
        self.fetch("create deal", request).await
    }

    async fn update_stage(&self, id: DealId, stage: DealStage) -> Result<(), GatewayError> {
        let request = self
            .http
            .patch(self.url(&format!("/api/deals/{id}/stage")))
            .json(&UpdateStageRequest { stage });
        self.execute("update deal stage", request).await?;
        Ok(())
    }

    async fn close_deal(
        &self,
        id: DealId,
        request: &CloseDealRequest,
    ) -> Result<CloseDealResponse, GatewayError> {
        let request = self
            .http
            .post(self.url(&format!("/api/deals/{id}/close")))
            .json(request);
        self.fetch("close deal", request).await
    }

    async fn lose_deal(&self, id: DealId, reason: LossReason) -> Result<(), GatewayError> {
        let request = self
            .http
            .post(self.url(&format!("/api/deals/{id}/lose")))
            .json(&LoseDealRequest { reason });
        self.execute("archive deal", request).await?;
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<SearchResponse, GatewayError> {
        let request = self.http.get(self.url("/api/search")).query(&[("q", query)]);
        self.fetch("search", request).await
    }
}
