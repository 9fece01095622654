//! Injectable HTTP capability behind the fallback transport and the proxy
//! forwarder.
//!
//! Provides a thin adapter around `reqwest::Client` so request assembly
//! (headers, body) stays observable under test without touching the network.

use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Response returned by an [`HttpClient`] implementation.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

/// Plain POST capability. Implementations must not cancel an in-flight
/// request when the caller goes away; the library relies on that for
/// teardown-time delivery.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn post(
        &self,
        url: &Url,
        headers: &HeaderMap,
        body: String,
    ) -> Result<HttpResponse, HttpClientError>;
}

/// Reqwest-backed HTTP client.
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self, HttpClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|err| HttpClientError::Transport(err.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post(
        &self,
        url: &Url,
        headers: &HeaderMap,
        body: String,
    ) -> Result<HttpResponse, HttpClientError> {
        let response = self
            .client
            .post(url.clone())
            .headers(headers.clone())
            .body(body)
            .send()
            .await
            .map_err(|err| HttpClientError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|err| HttpClientError::Transport(err.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
