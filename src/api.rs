//! HTTP client for the indexing API.

use std::{collections::HashMap, time::Duration};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{deployer::DeploymentPayload, error::ApiError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// For endpoints that take no query parameters.
pub const NO_QUERY: &[(&str, &str)] = &[];

/// Authenticated client. Every request carries the API key as a bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Answer of the nonce endpoint, keyed by `"{address}.{chain}.{network}"`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NonceResponse {
    #[serde(default)]
    pub nonces: HashMap<String, u64>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current nonces of `address` on every chain the API knows about.
    pub async fn nonces(&self, address: &str) -> Result<NonceResponse, ApiError> {
        self.get_json("/v1/address/nonce", &[("addresses", address)])
            .await
    }

    /// Submits one address' signed deployments in a single request.
    pub async fn deploy_contracts(
        &self,
        payloads: &[DeploymentPayload],
    ) -> Result<String, ApiError> {
        let (_, body) = self.post_json("/v1/contracts/deploy", payloads).await?;
        Ok(body)
    }

    /// GET returning the body verbatim.
    pub async fn get_text<Q>(&self, path: &str, query: &Q) -> Result<String, ApiError>
    where
        Q: Serialize + ?Sized,
    {
        let request = self.client.get(self.url(path)).query(query);
        let response = self.send(request).await?;
        Ok(response.text().await?)
    }

    /// GET decoding the body as JSON.
    pub async fn get_json<Q, T>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.get(self.url(path)).query(query);
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    /// POST with a JSON body. Returns the success status, which tells created
    /// (201) from already present (200) apart, and the body.
    pub async fn post_json<B>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(StatusCode, String), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let request = self.client.post(self.url(path)).json(body);
        let response = self.send(request).await?;
        let status = response.status();
        Ok((status, response.text().await?))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.bearer_auth(&self.api_key).send().await?;
        tracing::debug!("{} {}", response.status(), response.url());
        handle_response(response).await
    }
}

/// Only 200 and 201 count as success.
async fn handle_response(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status == StatusCode::OK || status == StatusCode::CREATED {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_owned());
    Err(ApiError::Status { status, body })
}
